use crate::types::{AppError, Chunk, Document, Result};
use tracing::debug;

/// Splits text into fixed-size character windows that share
/// `chunk_overlap` characters with their neighbour.
///
/// Sizes are counted in `char`s, so a window never splits a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance in chars between the starts of consecutive windows.
    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.windows(text)
            .into_iter()
            .map(|(_, window)| window.to_string())
            .collect()
    }

    /// Chunk every document, keeping document order and in-document order.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (document_index, document) in documents.iter().enumerate() {
            for (chunk_index, (start_char, window)) in
                self.windows(&document.content).into_iter().enumerate()
            {
                chunks.push(Chunk {
                    text: window.to_string(),
                    source: document.source.clone(),
                    document_index,
                    chunk_index,
                    start_char,
                });
            }
        }

        debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "Chunked documents"
        );
        chunks
    }

    /// Returns `(start_char, window)` pairs borrowed from `text`.
    fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        // Byte offset of every char boundary, including the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        let mut windows = Vec::new();
        let mut start = 0;
        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            windows.push((start, &text[boundaries[start]..boundaries[end]]));
            if end == char_count {
                break;
            }
            start += self.step();
        }

        windows
    }
}

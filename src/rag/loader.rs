use crate::types::{AppError, Document, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions read as plain text when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "sql", "md"];

/// Loads every plain-text file under a directory as a [`Document`].
///
/// Files are visited in path order so repeated builds over the same tree
/// produce the same chunk order. A file that cannot be read as UTF-8 is
/// logged and skipped.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document directory not found: {}", self.root.display()),
            )));
        }

        let (documents, skipped) = self.walk();
        info!(
            root = ?self.root,
            documents = documents.len(),
            skipped = skipped.len(),
            "Loaded documents"
        );
        Ok(documents)
    }

    /// Documents in path order, plus every path that could not be read.
    fn walk(&self) -> (Vec<Document>, Vec<PathBuf>) {
        let mut documents = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                    warn!(path = ?path, error = %e, "Skipping unreadable path");
                    skipped.push(path);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.accepts(path) {
                continue;
            }

            match std::fs::read_to_string(path) {
                Ok(content) => {
                    debug!(path = ?path, chars = content.chars().count(), "Loaded document");
                    documents.push(Document::new(content, path.display().to_string()));
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Skipping unreadable document");
                    skipped.push(path.to_path_buf());
                }
            }
        }

        (documents, skipped)
    }
}

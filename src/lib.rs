//! # rag-search
//!
//! A retrieval-augmented-generation pipeline: documents are chunked,
//! embedded into an exact flat L2 index, persisted next to their chunk
//! records, and queried top-k. Retrieved chunks are forwarded with the
//! question to an LLM for answer synthesis.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragsearch::{Provider, SearchConfig, SearchService, StoreConfig, VectorStore};
//! use ragsearch::rag::embeddings::FastEmbedder;
//! use ragsearch::rag::loader::DirectoryLoader;
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> ragsearch::Result<()> {
//!     let model = "sentence-transformers/all-MiniLM-L6-v2";
//!     let embedder = Arc::new(FastEmbedder::new(model)?);
//!     let store = Arc::new(VectorStore::new(
//!         StoreConfig::new("faiss_store", model),
//!         embedder,
//!         Duration::from_secs(120),
//!     )?);
//!
//!     store
//!         .load_or_build(|| DirectoryLoader::new("data").load())
//!         .await?;
//!
//!     let llm = Provider::groq(std::env::var("GROQ_API").unwrap_or_default())
//!         .create_client()
//!         .await?;
//!     let search = SearchService::new(store, llm, SearchConfig::default());
//!     println!("{}", search.answer("What tables hold invoices?").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | In-process fastembed models (default) |
//! | `openai` | OpenAI-compatible chat completions, incl. Groq (default) |
//! | `ollama` | Ollama local inference |
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embedding, persistence, vector store and search
//! - [`llm`] - LLM client implementations
//! - [`cli`] - Command-line interface definitions and output helpers
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Command-line interface definitions and output helpers.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (documents, chunks, hits, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, Provider};
pub use rag::embeddings::{Embedder, EmbeddingService};
pub use rag::search::{SearchConfig, SearchService};
pub use rag::store::{StoreConfig, StoreState, VectorStore};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigError, RagSearchConfig};

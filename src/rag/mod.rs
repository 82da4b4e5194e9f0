//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! Documents are chunked, embedded into an exact flat L2 index, persisted,
//! and queried top-k. Retrieved chunks are handed to an LLM for answering.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Character-window chunking with overlap
//! - [`rag::embeddings`](crate::rag::embeddings) - Embedding backends (fastembed, OpenAI-compatible)
//! - [`rag::persist`](crate::rag::persist) - The two on-disk store artifacts
//! - [`rag::store`](crate::rag::store) - Build / load / query orchestration
//! - [`rag::search`](crate::rag::search) - Retrieval plus LLM answer synthesis
//! - [`rag::loader`](crate::rag::loader) - Plain-text directory loading
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - Documents are chunked and embedded
//! 2. **Storage** - Vectors and chunk records written side by side
//! 3. **Retrieval** - Query embedded with the same model, nearest chunks returned
//! 4. **Generation** - LLM answers from the retrieved context
//!
//! # Example
//!
//! ```ignore
//! use ragsearch::rag::store::{StoreConfig, VectorStore};
//! use ragsearch::rag::loader::DirectoryLoader;
//!
//! let config = StoreConfig::new("faiss_store", embedder.model_id());
//! let store = VectorStore::new(config, embedder, Duration::from_secs(30))?;
//!
//! let documents = DirectoryLoader::new("data").load()?;
//! store.build(&documents).await?;
//!
//! for hit in store.query("how are invoices stored?", 5).await? {
//!     println!("{:.3} {}", hit.distance, hit.source);
//! }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod persist;
pub mod search;
pub mod store;

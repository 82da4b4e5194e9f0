//! LLM Provider Clients and Abstractions
//!
//! Answer synthesis goes through the [`LLMClient`] trait so the search
//! service never depends on a concrete provider.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI-compatible chat completions (OpenAI, Groq, OpenRouter)
//! - `ollama` - Local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use ragsearch::llm::Provider;
//!
//! let client = Provider::groq(std::env::var("GROQ_API")?).create_client().await?;
//! let answer = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};

//! Mock implementations for testing.
//!
//! Deterministic embedders and LLM clients shared by the integration tests,
//! so no test downloads a model or talks to a network service.

#![allow(dead_code)]

use async_trait::async_trait;
use ragsearch::types::{AppError, Result};
use ragsearch::{Embedder, LLMClient};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MOCK_EMBEDDING_MODEL: &str = "mock/letter-frequency";

/// Embeds text as its 26 lowercase ASCII letter counts.
///
/// Identical text always maps to the identical vector, and texts made of
/// one repeated letter land on distinct axes, which makes nearest-neighbour
/// expectations easy to write by hand.
///
/// # Examples
///
/// ```ignore
/// let embedder = MockEmbedder::new();
/// // "AAAA" -> [4, 0, 0, ...], "BBBB" -> [0, 4, 0, ...]
///
/// let embedder = MockEmbedder::failing_after(1);  // first call ok, then BackendFailure
/// let embedder = MockEmbedder::slow(Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct MockEmbedder {
    model: String,
    delay: Option<Duration>,
    fail_after: Option<usize>,
    calls: Arc<AtomicUsize>,
    hang: Arc<AtomicBool>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            model: MOCK_EMBEDDING_MODEL.to_string(),
            delay: None,
            fail_after: None,
            calls: Arc::new(AtomicUsize::new(0)),
            hang: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Same vectors, reported under a different model id.
    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::new()
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Succeeds for the first `calls` calls, then fails with `BackendFailure`.
    pub fn failing_after(calls: usize) -> Self {
        Self {
            fail_after: Some(calls),
            ..Self::new()
        }
    }

    /// From now on every call sleeps for an hour.
    pub fn start_hanging(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut counts = vec![0.0f32; 26];
        for c in text.chars() {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() {
                counts[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        counts
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(limit) = self.fail_after {
            if call >= limit {
                return Err(AppError::BackendFailure("Mock embedder failure".to_string()));
            }
        }

        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Mock LLM client for testing with configurable responses.
///
/// Records the last prompt it was given so tests can inspect what the
/// search service assembled.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
    last_prompt: Arc<parking_lot::Mutex<Option<String>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            delay: None,
            last_prompt: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Create a mock client that answers only after `delay`.
    pub fn slow(response: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(response)
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        *self.last_prompt.lock() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

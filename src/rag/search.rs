//! Question answering over a [`VectorStore`].
//!
//! [`SearchService`] retrieves the top-k chunks for a question, assembles a
//! context prompt and makes a single LLM call to produce the answer.

use crate::llm::LLMClient;
use crate::rag::store::VectorStore;
use crate::types::{AppError, Answer, QueryHit, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

const INSTRUCTION: &str = "Use the following context to answer the question concisely.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    #[serde(with = "duration_secs")]
    pub llm_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

pub struct SearchService {
    store: Arc<VectorStore>,
    llm: Arc<dyn LLMClient>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(store: Arc<VectorStore>, llm: Arc<dyn LLMClient>, config: SearchConfig) -> Self {
        Self { store, llm, config }
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Top-k chunks for `query`, closest first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<QueryHit>> {
        self.store.query(query, self.config.top_k).await
    }

    /// Context block of hit texts in rank order, then the question.
    pub fn build_prompt(&self, query: &str, hits: &[QueryHit]) -> String {
        format_prompt(query, hits)
    }

    pub async fn answer(&self, query: &str) -> Result<String> {
        Ok(self.answer_with_sources(query).await?.text)
    }

    #[instrument(skip(self, query), fields(model = self.llm.model_name()))]
    pub async fn answer_with_sources(&self, query: &str) -> Result<Answer> {
        let hits = self.retrieve(query).await?;
        if hits.is_empty() {
            warn!("No context retrieved; answering without it");
        }

        let prompt = self.build_prompt(query, &hits);
        debug!(hits = hits.len(), prompt_chars = prompt.len(), "Calling LLM");

        let text = tokio::time::timeout(self.config.llm_timeout, self.llm.generate(&prompt))
            .await
            .map_err(|_| AppError::BackendTimeout {
                operation: format!("generate ({})", self.llm.model_name()),
                timeout: self.config.llm_timeout,
            })?
            .map_err(|e| match e {
                AppError::LLM(msg) => AppError::BackendFailure(msg),
                other => other,
            })?;

        Ok(Answer {
            text: text.trim().to_string(),
            sources: hits,
        })
    }
}

fn format_prompt(query: &str, hits: &[QueryHit]) -> String {
    let context = hits
        .iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
        INSTRUCTION, context, query
    )
}

//! Dense embedding backends.
//!
//! An [`Embedder`] maps texts to fixed-width vectors with one model. The
//! [`EmbeddingService`] owns exactly one embedder for the lifetime of a
//! vector store, so build-time and query-time vectors always come from the
//! same model instance.

use crate::types::{AppError, Chunk, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors.
    fn model_id(&self) -> &str;

    /// Embed `texts`, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

// ============= Local ONNX models (fastembed) =============

const SENTENCE_TRANSFORMERS_ORG: &str = "sentence-transformers";
const SENTENCE_TRANSFORMERS_MODELS: &[&str] = &["all-MiniLM-L6-v2", "all-MiniLM-L12-v2"];

/// Canonical spelling of a local model identifier.
///
/// Bare sentence-transformers names gain their organisation prefix, so
/// `all-MiniLM-L6-v2` and `sentence-transformers/all-MiniLM-L6-v2` name the
/// same store. Other identifiers are returned unchanged.
pub fn canonical_model_id(model_id: &str) -> String {
    if SENTENCE_TRANSFORMERS_MODELS.contains(&model_id) {
        format!("{}/{}", SENTENCE_TRANSFORMERS_ORG, model_id)
    } else {
        model_id.to_string()
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::{canonical_model_id, Embedder};
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing::info;

    /// Sentence embeddings computed in-process with fastembed.
    ///
    /// The model is downloaded and initialised once in [`FastEmbedder::new`];
    /// every later call reuses it.
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
        model_id: String,
    }

    impl FastEmbedder {
        pub fn new(model_id: &str) -> Result<Self> {
            let model_id = canonical_model_id(model_id);
            let model = resolve_model(&model_id)?;
            let embedding = TextEmbedding::try_new(
                InitOptions::new(model).with_show_download_progress(true),
            )
            .map_err(|e| AppError::BackendFailure(format!("Failed to load '{}': {}", model_id, e)))?;

            info!(model = %model_id, "Loaded embedding model");
            Ok(Self {
                model: Arc::new(Mutex::new(embedding)),
                model_id,
            })
        }
    }

    /// Map a model identifier onto a fastembed model.
    pub(crate) fn resolve_model(model_id: &str) -> Result<EmbeddingModel> {
        match canonical_model_id(model_id).as_str() {
            "sentence-transformers/all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "sentence-transformers/all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "BAAI/bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
            "nomic-ai/nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
            "intfloat/multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
            other => Err(AppError::Configuration(format!(
                "Unsupported local embedding model '{}'",
                other
            ))),
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        fn model_id(&self) -> &str {
            &self.model_id
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();

            // ONNX inference is CPU-bound; keep it off the async workers.
            tokio::task::spawn_blocking(move || {
                let mut model = model.lock();
                model
                    .embed(texts, None)
                    .map_err(|e| AppError::BackendFailure(e.to_string()))
            })
            .await
            .map_err(|e| AppError::Internal(format!("Embedding task panicked: {}", e)))?
        }
    }

}

// ============= OpenAI-compatible HTTP embeddings =============

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAIEmbedder {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::BackendFailure(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendFailure(format!(
                "Embedding endpoint returned {}: {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::BackendFailure(format!("Invalid embedding response: {}", e)))?;

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

// ============= Embedding Service =============

/// Default number of texts sent to the backend per call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Shape-checked, time-bounded access to one [`Embedder`].
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
    batch_size: usize,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self {
            embedder,
            timeout,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Embed every chunk, one vector per chunk in chunk order.
    ///
    /// Fails with `ShapeMismatch` if the backend returns the wrong number of
    /// vectors or vectors of differing width.
    #[instrument(skip(self, chunks), fields(model = self.model_id(), chunks = chunks.len()))]
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(chunks.len());
        let mut dimensions: Option<usize> = None;

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = self.call_backend(&texts).await?;

            if embedded.len() != texts.len() {
                return Err(AppError::ShapeMismatch(format!(
                    "backend returned {} embeddings for {} chunks",
                    embedded.len(),
                    texts.len()
                )));
            }

            for vector in embedded {
                let expected = *dimensions.get_or_insert(vector.len());
                if vector.is_empty() || vector.len() != expected {
                    return Err(AppError::ShapeMismatch(format!(
                        "embedding {} has {} dimensions, expected {}",
                        vectors.len(),
                        vector.len(),
                        expected
                    )));
                }
                vectors.push(vector);
            }
        }

        debug!(count = vectors.len(), dimensions = ?dimensions, "Embedded chunks");
        Ok(vectors)
    }

    /// Embed a single query string with the same model used at build time.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let mut embedded = self.call_backend(&texts).await?;

        if embedded.len() != 1 {
            return Err(AppError::ShapeMismatch(format!(
                "backend returned {} embeddings for one query",
                embedded.len()
            )));
        }
        let vector = embedded.remove(0);
        if vector.is_empty() {
            return Err(AppError::ShapeMismatch(
                "query embedding is empty".to_string(),
            ));
        }
        Ok(vector)
    }

    async fn call_backend(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::timeout(self.timeout, self.embedder.embed(texts))
            .await
            .map_err(|_| AppError::BackendTimeout {
                operation: format!("embed ({})", self.embedder.model_id()),
                timeout: self.timeout,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_canonical_model_id() {
        assert_eq!(
            canonical_model_id("all-MiniLM-L6-v2"),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(
            canonical_model_id("sentence-transformers/all-MiniLM-L6-v2"),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(canonical_model_id("BAAI/bge-small-en-v1.5"), "BAAI/bge-small-en-v1.5");
        assert_eq!(
            canonical_model_id("text-embedding-3-small"),
            "text-embedding-3-small"
        );
    }

    /// Returns `[len, first byte]` per text, or a fixed broken shape.
    struct StubEmbedder {
        drop_last: bool,
        ragged: bool,
        delay: Option<Duration>,
    }

    impl StubEmbedder {
        fn ok() -> Self {
            Self {
                drop_last: false,
                ragged: false,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn model_id(&self) -> &str {
            "stub"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut out: Vec<Vec<f32>> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let first = t.bytes().next().unwrap_or(0) as f32;
                    if self.ragged && i == 1 {
                        vec![t.len() as f32]
                    } else {
                        vec![t.len() as f32, first]
                    }
                })
                .collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }
    }

    fn chunk(text: &str, i: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: "doc".to_string(),
            document_index: 0,
            chunk_index: i,
            start_char: 0,
        }
    }

    #[tokio::test]
    async fn test_embed_chunks_across_batches() {
        let service = EmbeddingService::new(Arc::new(StubEmbedder::ok()), Duration::from_secs(5))
            .with_batch_size(2);
        let chunks: Vec<Chunk> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .enumerate()
            .map(|(i, t)| chunk(t, i))
            .collect();

        let vectors = service.embed_chunks(&chunks).await.unwrap();
        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[4], vec![5.0, b'e' as f32]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_shape_error() {
        let stub = StubEmbedder {
            drop_last: true,
            ..StubEmbedder::ok()
        };
        let service = EmbeddingService::new(Arc::new(stub), Duration::from_secs(5));
        let result = service.embed_chunks(&[chunk("a", 0), chunk("b", 1)]).await;
        assert!(matches!(result, Err(AppError::ShapeMismatch(_))));
    }

    #[tokio::test]
    async fn test_ragged_dimensions_is_shape_error() {
        let stub = StubEmbedder {
            ragged: true,
            ..StubEmbedder::ok()
        };
        let service = EmbeddingService::new(Arc::new(stub), Duration::from_secs(5));
        let result = service
            .embed_chunks(&[chunk("a", 0), chunk("b", 1), chunk("c", 2)])
            .await;
        assert!(matches!(result, Err(AppError::ShapeMismatch(_))));
    }

    #[tokio::test]
    async fn test_backend_timeout() {
        let stub = StubEmbedder {
            delay: Some(Duration::from_millis(200)),
            ..StubEmbedder::ok()
        };
        let service = EmbeddingService::new(Arc::new(stub), Duration::from_millis(10));
        let result = service.embed_query("slow").await;
        assert!(matches!(result, Err(AppError::BackendTimeout { .. })));
    }

    #[tokio::test]
    async fn test_embed_query() {
        let service = EmbeddingService::new(Arc::new(StubEmbedder::ok()), Duration::from_secs(5));
        let vector = service.embed_query("xyz").await.unwrap();
        assert_eq!(vector, vec![3.0, b'x' as f32]);
        assert_eq!(service.model_id(), "stub");
    }

    #[tokio::test]
    async fn test_openai_embedder_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                ],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(
            format!("{}/v1/", server.uri()),
            Some("sk-test".to_string()),
            "text-embedding-3-small",
        );
        let vectors = embedder
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(embedder.model_id(), "text-embedding-3-small");
    }

    #[tokio::test]
    async fn test_openai_embedder_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(server.uri(), None, "m");
        let result = embedder.embed(&["x".to_string()]).await;
        match result {
            Err(AppError::BackendFailure(msg)) => assert!(msg.contains("503")),
            other => panic!("Expected BackendFailure, got {:?}", other),
        }
    }
}

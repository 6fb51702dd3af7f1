//! Gemini embedding provider over the REST embeddings API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "gemini-embedding-001";

/// The default dimensionality for `gemini-embedding-001`.
const DEFAULT_DIMENSIONS: usize = 3072;

/// Embedding requests are bounded; a hung backend fails the call instead
/// of stalling ingestion.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` API.
///
/// Batch requests go through `batchEmbedContents`, so one document is one
/// HTTP call regardless of chunk count.
///
/// # Configuration
///
/// - `task_type` — defaults to `RETRIEVAL_DOCUMENT`; use
///   [`with_task_type`](Self::with_task_type) to switch (e.g.
///   `RETRIEVAL_QUERY`).
/// - `output_dimensionality` — optional truncation of the output vector,
///   which also updates [`dimensions()`](EmbeddingProvider::dimensions).
///
/// # Example
///
/// ```rust,ignore
/// use documind_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    task_type: String,
    output_dimensionality: Option<usize>,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider with the given API key and the default
    /// `gemini-embedding-001` model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ModelUnavailable("Gemini API key must not be empty".into()));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            RagError::ModelUnavailable(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.into(),
            base_url: GEMINI_API_BASE.into(),
            task_type: "RETRIEVAL_DOCUMENT".into(),
            output_dimensionality: None,
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a provider using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| {
            RagError::ModelUnavailable("GOOGLE_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the task type sent with embedding requests.
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Truncate output vectors to the given dimensionality.
    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.output_dimensionality = Some(dims);
        self.dimensions = dims;
        self
    }

    /// Override the API base URL (e.g. for a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn embed_request<'a>(&'a self, text: &'a str) -> EmbedRequest<'a> {
        EmbedRequest {
            model: None,
            content: WireContent { parts: vec![WirePart { text }] },
            task_type: &self.task_type,
            output_dimensionality: self.output_dimensionality,
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = format!("{}/models/{}:{endpoint}", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "Gemini", error = %e, "embedding request failed");
                RagError::Backend { backend: "Gemini".into(), message: format!("request failed: {e}") }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

            error!(backend = "Gemini", %status, "embedding API error");
            return Err(RagError::Backend {
                backend: "Gemini".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        response.json().await.map_err(|e| {
            error!(backend = "Gemini", error = %e, "failed to parse response");
            RagError::Backend {
                backend: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    /// Required by the batch endpoint, omitted on single requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    content: WireContent<'a>,
    task_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct WireContent<'a> {
    parts: Vec<WirePart<'a>>,
}

#[derive(Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(backend = "Gemini", text_len = text.len(), "embedding single text");

        let response: EmbedResponse =
            self.post_json("embedContent", &self.embed_request(text)).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(backend = "Gemini", batch_size = texts.len(), model = %self.model, "embedding batch");

        let qualified = format!("models/{}", self.model);
        let requests = texts
            .iter()
            .map(|text| {
                let mut request = self.embed_request(text);
                request.model = Some(qualified.clone());
                request
            })
            .collect();

        let response: BatchEmbedResponse =
            self.post_json("batchEmbedContents", &BatchEmbedRequest { requests }).await?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::Backend {
                backend: "Gemini".into(),
                message: format!(
                    "API returned {} embeddings for {} inputs",
                    response.embeddings.len(),
                    texts.len()
                ),
            });
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

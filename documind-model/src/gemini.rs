//! Gemini model backend streaming over SSE.
//!
//! Calls the `streamGenerateContent` REST endpoint with `alt=sse` and
//! decodes the event stream into [`LlmResponse`] fragments.

use std::time::Duration;

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse, LlmResponseStream};

/// The default Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// How long to wait for the connection to the backend.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An [`Llm`] backed by the Gemini `streamGenerateContent` API.
///
/// # Example
///
/// ```rust,ignore
/// use documind_model::gemini::GeminiModel;
///
/// let model = GeminiModel::from_env()?;
/// let stream = model.generate_stream(request).await?;
/// ```
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    /// Create a new model client with the given API key and model name.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::MissingApiKey("API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ModelError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_key, model: model.into(), base_url: GEMINI_API_BASE.into() })
    }

    /// Create a client from the `GOOGLE_API_KEY` environment variable,
    /// using the default model.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| {
            ModelError::MissingApiKey("GOOGLE_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key, DEFAULT_MODEL)
    }

    /// Override the API base URL (e.g. for a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ── Gemini API wire types ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
struct WirePart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: Option<WireResponseContent>,
}

#[derive(Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Deserialize)]
struct WireResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn to_wire_request(request: &LlmRequest) -> WireRequest {
    WireRequest {
        system_instruction: request.system_instruction.as_ref().map(|text| WireContent {
            role: None,
            parts: vec![WirePart { text: text.clone() }],
        }),
        contents: request
            .contents
            .iter()
            .map(|c| WireContent {
                role: Some(c.role.clone()),
                parts: vec![WirePart { text: c.text.clone() }],
            })
            .collect(),
        generation_config: request.config.as_ref().map(|c| WireGenerationConfig {
            temperature: c.temperature,
            max_output_tokens: c.max_output_tokens,
        }),
    }
}

/// Concatenate the text parts of the first candidate in a stream chunk.
fn chunk_text(response: &WireResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_stream(&self, request: LlmRequest) -> Result<LlmResponseStream> {
        let url = format!("{}/models/{}:streamGenerateContent?alt=sse", self.base_url, self.model);
        let body = to_wire_request(&request);

        debug!(model = %self.model, messages = request.contents.len(), "starting generation stream");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "generation request failed");
                ModelError::Request(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(model = %self.model, status, "generation API error");
            return Err(ModelError::Api { status, message: detail });
        }

        let mut events = response.bytes_stream().eventsource();

        let stream = try_stream! {
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| ModelError::Stream(format!("{e}")))?;
                let parsed: WireResponse = serde_json::from_str(&event.data)
                    .map_err(|e| ModelError::Stream(format!("undecodable event: {e}")))?;
                let text = chunk_text(&parsed);
                if !text.is_empty() {
                    yield LlmResponse { text };
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Content, GenerateConfig};

    #[test]
    fn parses_stream_chunk_text() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}],"role":"model"},"index":0}]}"#;
        let parsed: WireResponse = serde_json::from_str(data).unwrap();
        assert_eq!(chunk_text(&parsed), "Hello, world");
    }

    #[test]
    fn tolerates_chunks_without_content() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        let parsed: WireResponse = serde_json::from_str(data).unwrap();
        assert_eq!(chunk_text(&parsed), "");
    }

    #[test]
    fn serializes_request_in_api_shape() {
        let request = LlmRequest::new(vec![Content::new("user").with_text("hi")])
            .with_system_instruction("be brief")
            .with_config(GenerateConfig { temperature: Some(0.7), max_output_tokens: None });

        let value = serde_json::to_value(to_wire_request(&request)).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["temperature"], 0.7);
        assert!(value["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(matches!(GeminiModel::new("", DEFAULT_MODEL), Err(ModelError::MissingApiKey(_))));
    }
}

//! The [`Llm`] trait and its request/response types.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A single message in a model conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// The speaker role, typically `"user"` or `"model"`.
    pub role: String,
    /// The message text.
    pub text: String,
}

impl Content {
    /// Create an empty message for the given role.
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), text: String::new() }
    }

    /// Set the message text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Sampling parameters for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// A generation request sent to an [`Llm`] backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmRequest {
    /// Optional system instruction prepended to the conversation.
    pub system_instruction: Option<String>,
    /// The conversation messages, oldest first.
    pub contents: Vec<Content>,
    /// Optional sampling configuration.
    pub config: Option<GenerateConfig>,
}

impl LlmRequest {
    /// Create a request from a set of messages.
    pub fn new(contents: Vec<Content>) -> Self {
        Self { system_instruction: None, contents, config: None }
    }

    /// Set the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set the sampling configuration.
    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// One incremental fragment of a streamed model response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// The text fragment carried by this chunk. May be empty for
    /// keep-alive or metadata-only chunks.
    pub text: String,
}

/// A pinned stream of response fragments.
///
/// Each item is either a fragment or the error that terminated the stream.
/// Dropping the stream aborts the underlying request.
pub type LlmResponseStream = BoxStream<'static, std::result::Result<LlmResponse, ModelError>>;

/// A streaming language-model backend.
///
/// Implementations wrap a specific provider behind a unified async
/// interface. Fragments are yielded in arrival order with no buffering
/// beyond what the backend itself provides.
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier, e.g. `"gemini-2.5-flash"`.
    fn name(&self) -> &str;

    /// Start a streaming generation for the given request.
    ///
    /// Returns an error if the request cannot be started at all; failures
    /// after the first fragment surface as `Err` items on the stream.
    async fn generate_stream(&self, request: LlmRequest) -> Result<LlmResponseStream>;
}

//! A scriptable mock model for tests.

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse, LlmResponseStream};

/// An [`Llm`] that replays a scripted fragment sequence.
///
/// Optionally ends the stream with a scripted error, which makes it
/// useful for exercising consumer failure paths without a network.
///
/// # Example
///
/// ```rust,ignore
/// use documind_model::MockLlm;
///
/// let llm = MockLlm::new(["The ", "answer."]);
/// let failing = MockLlm::new(["partial "]).with_stream_error("quota exceeded");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockLlm {
    fragments: Vec<String>,
    stream_error: Option<String>,
}

impl MockLlm {
    /// Create a mock that yields the given fragments in order.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fragments: fragments.into_iter().map(Into::into).collect(), stream_error: None }
    }

    /// Terminate the stream with the given error after all fragments.
    pub fn with_stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_stream(&self, _request: LlmRequest) -> Result<LlmResponseStream> {
        let items: Vec<std::result::Result<LlmResponse, ModelError>> = self
            .fragments
            .iter()
            .map(|text| Ok(LlmResponse { text: text.clone() }))
            .chain(self.stream_error.clone().map(|m| Err(ModelError::Stream(m))))
            .collect();

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

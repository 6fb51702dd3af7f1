//! Streamed answer generation over retrieved passages.
//!
//! The [`AnswerEngine`] assembles a context-grounded prompt and relays
//! model fragments as [`AnswerEvent`]s. A backend failure becomes a
//! terminal [`AnswerEvent::Error`] on the same channel as ordinary
//! tokens, so a consumer already mid-stream always receives an explicit
//! terminating signal instead of a silently truncated answer.

use std::sync::Arc;

use async_stream::stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::error;

use documind_model::{Content, GenerateConfig, Llm, LlmRequest};

use crate::document::RetrievedPassage;
use crate::error::{RagError, Result};

/// Constrains the model to the supplied context.
const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant that answers questions based on \
    the provided context from documents. Use only the information from the context to answer the \
    question. If the context doesn't contain enough information, say so clearly. Be concise and \
    accurate.";

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One event on an [`AnswerStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvent {
    /// An incremental answer fragment, in arrival order.
    Token(String),
    /// The backend failed; this is the final event on the stream.
    Error(String),
}

/// A pinned stream of answer events. Dropping it cancels the underlying
/// model request.
pub type AnswerStream = BoxStream<'static, AnswerEvent>;

/// Concatenate passages into a citation-labeled context block.
///
/// Each passage is labeled with a 1-based index and its source filename
/// (`Unknown` when the metadata carries none), separated by blank lines.
pub fn build_context(passages: &[RetrievedPassage]) -> String {
    let parts: Vec<String> = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let filename =
                passage.metadata.get("filename").map(String::as_str).unwrap_or("Unknown");
            format!("[Document {} - {}]\n{}\n", i + 1, filename, passage.content)
        })
        .collect();
    parts.join("\n")
}

/// Generates answers from retrieved passages via a streaming [`Llm`].
pub struct AnswerEngine {
    llm: Arc<dyn Llm>,
}

impl AnswerEngine {
    /// Create an engine over the given model backend.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    fn request(&self, query: &str, passages: &[RetrievedPassage]) -> LlmRequest {
        let context = build_context(passages);
        let user_prompt =
            format!("Context from documents:\n{context}\n\nQuestion: {query}\n\nAnswer:");

        LlmRequest::new(vec![Content::new("user").with_text(user_prompt)])
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_config(GenerateConfig {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_output_tokens: None,
            })
    }

    /// Stream an answer token by token.
    ///
    /// Tokens are yielded as they arrive, so the consumer can render
    /// before generation completes. Any failure, including one before
    /// the first token, surfaces as a terminal [`AnswerEvent::Error`].
    pub fn answer_stream(&self, query: &str, passages: &[RetrievedPassage]) -> AnswerStream {
        let request = self.request(query, passages);
        let llm = Arc::clone(&self.llm);

        Box::pin(stream! {
            let mut fragments = match llm.generate_stream(request).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    error!(error = %e, "failed to start generation");
                    yield AnswerEvent::Error(e.to_string());
                    return;
                }
            };

            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        if !fragment.text.is_empty() {
                            yield AnswerEvent::Token(fragment.text);
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "generation stream failed");
                        yield AnswerEvent::Error(e.to_string());
                        return;
                    }
                }
            }
        })
    }

    /// Generate the complete answer by draining the stream.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Backend`] if the stream terminated with an
    /// error event.
    pub async fn answer(&self, query: &str, passages: &[RetrievedPassage]) -> Result<String> {
        let mut stream = self.answer_stream(query, passages);
        let mut answer = String::new();

        while let Some(event) = stream.next().await {
            match event {
                AnswerEvent::Token(token) => answer.push_str(&token),
                AnswerEvent::Error(message) => {
                    return Err(RagError::Backend { backend: "llm".into(), message });
                }
            }
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn passage(content: &str, filename: Option<&str>) -> RetrievedPassage {
        let mut metadata = HashMap::new();
        if let Some(name) = filename {
            metadata.insert("filename".to_string(), name.to_string());
        }
        RetrievedPassage {
            content: content.to_string(),
            doc_id: "doc1".to_string(),
            chunk_id: "doc1_chunk_0".to_string(),
            score: 0.9,
            metadata,
        }
    }

    #[test]
    fn context_labels_passages_with_index_and_filename() {
        let context = build_context(&[
            passage("first passage", Some("report.pdf")),
            passage("second passage", None),
        ]);

        assert!(context.starts_with("[Document 1 - report.pdf]\nfirst passage\n"));
        assert!(context.contains("\n[Document 2 - Unknown]\nsecond passage\n"));
    }

    #[test]
    fn context_of_no_passages_is_empty() {
        assert_eq!(build_context(&[]), "");
    }
}

use documind_model::{Content, GeminiModel, Llm, LlmRequest, MockLlm, ModelError};
use futures::StreamExt;

/// Verify GeminiModel implements Llm (compile-time check)
fn _assert_llm_impl<T: Llm>() {}

#[test]
fn test_gemini_model_implements_llm_trait() {
    _assert_llm_impl::<GeminiModel>();
}

#[test]
fn test_gemini_model_creation() {
    let model = GeminiModel::new("test-api-key", "gemini-2.5-flash").unwrap();
    assert_eq!(model.name(), "gemini-2.5-flash");
}

#[test]
fn test_llm_request_creation() {
    let content = Content::new("user").with_text("Hello");
    let request = LlmRequest::new(vec![content]).with_system_instruction("answer briefly");

    assert_eq!(request.contents.len(), 1);
    assert_eq!(request.contents[0].role, "user");
    assert_eq!(request.system_instruction.as_deref(), Some("answer briefly"));
}

#[tokio::test]
async fn test_mock_replays_fragments_in_order() {
    let llm = MockLlm::new(["The ", "answer ", "is 42."]);
    let request = LlmRequest::new(vec![Content::new("user").with_text("?")]);

    let stream = llm.generate_stream(request).await.unwrap();
    let fragments: Vec<String> = stream.map(|r| r.unwrap().text).collect().await;

    assert_eq!(fragments, vec!["The ", "answer ", "is 42."]);
}

#[tokio::test]
async fn test_mock_stream_error_is_terminal() {
    let llm = MockLlm::new(["partial "]).with_stream_error("quota exceeded");
    let request = LlmRequest::new(vec![Content::new("user").with_text("?")]);

    let items: Vec<_> = llm.generate_stream(request).await.unwrap().collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().text, "partial ");
    assert!(matches!(items[1], Err(ModelError::Stream(_))));
}

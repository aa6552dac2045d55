//! Core LLM client trait, errors, and a scripted mock for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{AssistantMessage, CompletionRequest, CompletionResponse};

/// Stateless LLM client - every call receives the full history
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mock client has no scripted response left")]
    ScriptExhausted,
}

/// Mock client that replays scripted replies in order and records requests
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<AssistantMessage, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<AssistantMessage>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure to be returned by the next unconsumed call
    pub fn push_error(&self, error: LlmError) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(error));
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .responses
            .lock()
            .map_err(|e| LlmError::InvalidResponse(format!("mock lock poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(message)) => Ok(CompletionResponse {
                message,
                ..Default::default()
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::ScriptExhausted),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{Message, ToolCall};

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let mock = MockLlmClient::new(vec![
            AssistantMessage::with_tool_calls(vec![ToolCall::new(
                "c1",
                "get_rendered_html",
                serde_json::json!({"url": "http://site/quiz/1"}),
            )]),
            AssistantMessage::text("END"),
        ]);

        let first = mock.complete(CompletionRequest::new("sys")).await.unwrap();
        assert!(first.message.has_tool_calls());

        let second = mock.complete(CompletionRequest::new("sys")).await.unwrap();
        assert_eq!(second.message, AssistantMessage::text("END"));

        let third = mock.complete(CompletionRequest::new("sys")).await;
        assert!(matches!(third, Err(LlmError::ScriptExhausted)));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockLlmClient::new(vec![AssistantMessage::text("ok")]);
        let request = CompletionRequest::new("sys").with_messages(vec![Message::user("http://site/quiz/1")]);
        mock.complete(request).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "sys");
        assert_eq!(requests[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_push_error() {
        let mock = MockLlmClient::new(vec![]);
        mock.push_error(LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        });

        let result = mock.complete(CompletionRequest::new("sys")).await;
        assert!(matches!(result, Err(LlmError::Api { status: 401, .. })));
    }

    #[test]
    fn test_mock_identity() {
        let mock = MockLlmClient::new(vec![]);
        assert_eq!(mock.model(), "mock-model");
    }

    #[test]
    fn test_api_error_display() {
        let err = LlmError::Api {
            status: 429,
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "API error 429: quota");
    }
}

//! Gemini API client implementation
//!
//! This module implements the LlmClient trait for Google's Gemini
//! `generateContent` endpoint with function calling.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{
    AssistantMessage, CompletionRequest, CompletionResponse, Message, MessageContent, StopReason, ToolCall,
    ToolResultMessage, Usage,
};

/// Gemini API base URL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default max output tokens
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: GeminiConfig,
    usage: Mutex<Usage>,
    call_counter: AtomicU64,
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
            usage: Mutex::new(Usage::default()),
            call_counter: AtomicU64::new(0),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        )
    }

    /// Build the request body for the Gemini API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let mut generation_config = json!({ "maxOutputTokens": max_tokens });
        if let Some(temperature) = self.config.temperature {
            generation_config["temperature"] = json!(temperature);
        }

        let mut body = json!({
            "contents": to_contents(&request.messages),
            "generationConfig": generation_config
        });

        if !request.system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": request.system }] });
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request.tools.iter().map(|t| t.to_gemini_declaration()).collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> std::result::Result<CompletionResponse, LlmError> {
        let usage = body
            .get("usageMetadata")
            .map(|u| {
                Usage::new(
                    u["promptTokenCount"].as_u64().unwrap_or(0),
                    u["candidatesTokenCount"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        if let Ok(mut total) = self.usage.lock() {
            total.add(&usage);
        }

        let Some(candidate) = body["candidates"].as_array().and_then(|c| c.first()) else {
            let reason = body["promptFeedback"]["blockReason"].as_str().unwrap_or("no candidates returned");
            return Err(LlmError::InvalidResponse(format!("Empty response: {}", reason)));
        };

        let stop_reason = match candidate["finishReason"].as_str() {
            Some("STOP") | None => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => StopReason::Safety,
            Some(_) => StopReason::Other,
        };

        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();

        if let Some(parts) = candidate["content"]["parts"].as_array() {
            for part in parts {
                if part["thought"].as_bool().unwrap_or(false) {
                    continue;
                }
                if let Some(text) = part["text"].as_str() {
                    texts.push(text.to_string());
                } else if let Some(call) = part.get("functionCall") {
                    let name = call["name"]
                        .as_str()
                        .ok_or_else(|| LlmError::InvalidResponse("functionCall without name".to_string()))?;
                    let id = match call["id"].as_str() {
                        Some(id) => id.to_string(),
                        None => self.next_call_id(),
                    };
                    let input = call.get("args").cloned().unwrap_or_else(|| json!({}));
                    tool_calls.push(ToolCall::new(id, name, input));
                }
            }
        }

        let content = if texts.is_empty() {
            None
        } else {
            Some(MessageContent::Text(texts.concat()))
        };

        Ok(CompletionResponse {
            message: AssistantMessage { content, tool_calls },
            stop_reason,
            usage,
        })
    }

    fn next_call_id(&self) -> String {
        format!("call_{}", self.call_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Send a request to the Gemini API
    async fn send_request(&self, model: &str, body: Value) -> std::result::Result<Value, LlmError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

/// Convert the conversation into Gemini `contents`.
///
/// Consecutive tool results are merged into one turn, as Gemini expects all
/// function responses for a model turn together.
fn to_contents(messages: &[Message]) -> Vec<Value> {
    let mut contents: Vec<Value> = Vec::with_capacity(messages.len());
    let mut pending_responses: Vec<Value> = Vec::new();

    for message in messages {
        match message {
            Message::Tool(result) => pending_responses.push(function_response_part(result)),
            Message::User { content } => {
                flush_responses(&mut contents, &mut pending_responses);
                contents.push(json!({ "role": "user", "parts": [{ "text": content.text() }] }));
            }
            Message::Assistant(reply) => {
                flush_responses(&mut contents, &mut pending_responses);
                let mut parts = Vec::new();
                if let Some(content) = reply.content.as_ref().filter(|c| !c.is_empty()) {
                    parts.push(json!({ "text": content.text() }));
                }
                for call in &reply.tool_calls {
                    parts.push(json!({ "functionCall": { "name": call.name, "args": call.input } }));
                }
                if parts.is_empty() {
                    log::debug!("Skipping empty assistant turn in request history");
                    continue;
                }
                contents.push(json!({ "role": "model", "parts": parts }));
            }
        }
    }

    flush_responses(&mut contents, &mut pending_responses);
    contents
}

fn flush_responses(contents: &mut Vec<Value>, pending: &mut Vec<Value>) {
    if !pending.is_empty() {
        contents.push(json!({ "role": "user", "parts": std::mem::take(pending) }));
    }
}

fn function_response_part(result: &ToolResultMessage) -> Value {
    let response = if result.is_error {
        json!({ "error": result.content })
    } else {
        json!({ "content": result.content })
    };
    json!({ "functionResponse": { "name": result.name, "response": response } })
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, LlmError> {
        let model = request.model.clone().unwrap_or_else(|| self.config.model.clone());
        let body = self.build_request(&request);
        let response = self.send_request(&model, body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> GeminiClient {
        GeminiClient::with_api_key("test-key", GeminiConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.api_base, GEMINI_API_BASE);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_endpoint() {
        let client = test_client();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_basic() {
        let client = test_client();
        let request = CompletionRequest::new("You are a quiz solver").with_messages(vec![Message::user("http://site/quiz/1")]);

        let body = client.build_request(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a quiz solver");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "http://site/quiz/1");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], DEFAULT_MAX_TOKENS);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_with_tools() {
        let client = test_client();
        let tool = ToolDefinition::new(
            "get_rendered_html",
            "Fetch a page",
            json!({ "type": "object", "properties": { "url": { "type": "string" } }, "required": ["url"] }),
        );
        let request = CompletionRequest::new("sys")
            .with_messages(vec![Message::user("go")])
            .with_tools(vec![tool]);

        let body = client.build_request(&request);

        let decls = &body["tools"][0]["functionDeclarations"];
        assert_eq!(decls[0]["name"], "get_rendered_html");
        assert_eq!(decls[0]["parameters"]["required"][0], "url");
    }

    #[test]
    fn test_contents_merge_consecutive_tool_results() {
        let messages = vec![
            Message::user("http://site/quiz/1"),
            Message::Assistant(AssistantMessage::with_tool_calls(vec![
                ToolCall::new("c1", "get_rendered_html", json!({"url": "http://site/quiz/1"})),
                ToolCall::new("c2", "download_file", json!({"url": "http://site/data.csv", "filename": "data.csv"})),
            ])),
            Message::tool_result("c1", "get_rendered_html", "<html></html>", false),
            Message::tool_result("c2", "download_file", "404 Not Found", true),
            Message::Assistant(AssistantMessage::text("thinking")),
        ];

        let contents = to_contents(&messages);

        assert_eq!(contents.len(), 4);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][1]["functionCall"]["name"], "download_file");
        assert_eq!(contents[2]["role"], "user");
        let parts = contents[2]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["functionResponse"]["response"]["content"], "<html></html>");
        assert_eq!(parts[1]["functionResponse"]["response"]["error"], "404 Not Found");
        assert_eq!(contents[3]["parts"][0]["text"], "thinking");
    }

    #[test]
    fn test_contents_skip_empty_assistant_turn() {
        let messages = vec![
            Message::user("go"),
            Message::Assistant(AssistantMessage {
                content: Some(MessageContent::Blocks(vec![])),
                tool_calls: vec![],
            }),
        ];
        assert_eq!(to_contents(&messages).len(), 1);
    }

    #[test]
    fn test_parse_response_text_only() {
        let client = test_client();
        let response = client
            .parse_response(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "END" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 1 }
            }))
            .unwrap();

        assert_eq!(response.message, AssistantMessage::text("END"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage, Usage::new(10, 1));
    }

    #[test]
    fn test_parse_response_function_calls() {
        let client = test_client();
        let response = client
            .parse_response(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [
                        { "text": "Loading the page", "thought": true },
                        { "functionCall": { "name": "get_rendered_html", "args": { "url": "http://site/quiz/1" } } },
                        { "functionCall": { "id": "fc-9", "name": "run_code", "args": { "code": "print(2)" } } }
                    ]},
                    "finishReason": "STOP"
                }]
            }))
            .unwrap();

        let message = response.message;
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls.len(), 2);
        assert_eq!(message.tool_calls[0].id, "call_1");
        assert_eq!(message.tool_calls[0].input["url"], "http://site/quiz/1");
        assert_eq!(message.tool_calls[1].id, "fc-9");
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let client = test_client();
        let result = client.parse_response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        match result {
            Err(LlmError::InvalidResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("Expected invalid response, got {:?}", other.map(|r| r.message)),
        }
    }

    #[test]
    fn test_parse_response_stop_reasons() {
        let client = test_client();
        let cases = vec![
            ("STOP", StopReason::EndTurn),
            ("MAX_TOKENS", StopReason::MaxTokens),
            ("SAFETY", StopReason::Safety),
            ("RECITATION", StopReason::Other),
        ];

        for (reason, expected) in cases {
            let response = client
                .parse_response(json!({
                    "candidates": [{ "content": { "parts": [] }, "finishReason": reason }]
                }))
                .unwrap();
            assert_eq!(response.stop_reason, expected);
        }
    }

    #[test]
    fn test_total_usage_accumulation() {
        let client = test_client();
        for _ in 0..2 {
            let _ = client.parse_response(json!({
                "candidates": [{ "content": { "parts": [{ "text": "x" }] } }],
                "usageMetadata": { "promptTokenCount": 100, "candidatesTokenCount": 50 }
            }));
        }
        assert_eq!(client.total_usage(), Usage::new(200, 100));
    }

    #[test]
    fn test_debug_impl_hides_key() {
        let debug_str = format!("{:?}", test_client());
        assert!(debug_str.contains("GeminiClient"));
        assert!(debug_str.contains(DEFAULT_MODEL));
        assert!(!debug_str.contains("test-key"));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": "END" }] }, "finishReason": "STOP" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = GeminiConfig {
            api_base: server.uri(),
            ..Default::default()
        };
        let client = GeminiClient::with_api_key("test-key", config).unwrap();
        let response = client
            .complete(CompletionRequest::new("sys").with_messages(vec![Message::user("http://site/quiz/1")]))
            .await
            .unwrap();

        assert_eq!(response.message, AssistantMessage::text("END"));
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let config = GeminiConfig {
            api_base: server.uri(),
            ..Default::default()
        };
        let client = GeminiClient::with_api_key("bad-key", config).unwrap();
        let result = client.complete(CompletionRequest::new("sys").with_messages(vec![Message::user("go")])).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("Expected API error, got {:?}", other.map(|r| r.message)),
        }
    }
}

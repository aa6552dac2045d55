//! post_request tool - Submit a JSON payload to an endpoint

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use serde_json::Value;

use super::{Tool, ToolContext, ToolResult};

pub struct PostRequestTool;

#[async_trait]
impl Tool for PostRequestTool {
    fn name(&self) -> &'static str {
        "post_request"
    }

    fn description(&self) -> &'static str {
        "Send an HTTP POST with a JSON payload, e.g. to submit an answer. Returns the status and the \
         response body, which may contain the next quiz URL."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Endpoint to post to, exactly as given by the page"
                },
                "payload": {
                    "type": "object",
                    "description": "JSON body to send"
                },
                "headers": {
                    "type": "object",
                    "description": "Optional extra request headers"
                }
            },
            "required": ["url", "payload"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error> {
        let url = input["url"].as_str().ok_or_else(|| eyre!("url is required"))?;
        let payload = input.get("payload").ok_or_else(|| eyre!("payload is required"))?;

        let mut request = ctx.http.post(url).json(payload);
        if let Some(headers) = input.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.header(name.as_str(), value);
            }
        }

        log::debug!("POST {} payload={}", url, payload);

        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("Failed to post to {}", url))?;

        let status = response.status();
        let body = response.text().await.wrap_err("Failed to read response body")?;
        let content = format!("HTTP {}\n{}", status.as_u16(), ctx.truncate(body));

        if status.is_client_error() || status.is_server_error() {
            Ok(ToolResult::error(content))
        } else {
            Ok(ToolResult::success(content))
        }
    }
}

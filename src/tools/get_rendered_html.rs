//! get_rendered_html tool - Fetch a quiz page's HTML

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use serde_json::Value;

use super::{Tool, ToolContext, ToolResult};

pub struct GetRenderedHtmlTool;

#[async_trait]
impl Tool for GetRenderedHtmlTool {
    fn name(&self) -> &'static str {
        "get_rendered_html"
    }

    fn description(&self) -> &'static str {
        "Fetch a web page and return its HTML. Use this to load a quiz page and read its instructions, \
         data links, and submit endpoint. Scripts on the page are not executed, so content a script \
         would generate is missing; read the script source from the HTML and reproduce it with run_code."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL of the page to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error> {
        let url = input["url"].as_str().ok_or_else(|| eyre!("url is required"))?;

        let response = ctx
            .http
            .get(url)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        let body = response.text().await.wrap_err("Failed to read response body")?;

        if !status.is_success() {
            return Ok(ToolResult::error(format!("HTTP {} from {}\n{}", status, url, ctx.truncate(body))));
        }

        Ok(ToolResult::success(ctx.truncate(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_description_warns_scripts_do_not_run() {
        let description = GetRenderedHtmlTool.description();
        assert!(description.contains("Scripts on the page are not executed"));
        assert!(description.contains("run_code"));
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quiz/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Q1: sum the column</body></html>"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        let result = GetRenderedHtmlTool
            .execute(serde_json::json!({"url": format!("{}/quiz/1", server.uri())}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("sum the column"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        let result = GetRenderedHtmlTool
            .execute(serde_json::json!({"url": format!("{}/quiz/9", server.uri())}), &ctx)
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_truncates_long_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let mut ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        ctx.max_output_chars = 10;
        let result = GetRenderedHtmlTool
            .execute(serde_json::json!({"url": server.uri()}), &ctx)
            .await
            .unwrap();

        assert!(result.content.contains("[truncated, 100 chars total]"));
    }

    #[tokio::test]
    async fn test_missing_url() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        let result = GetRenderedHtmlTool.execute(serde_json::json!({}), &ctx).await;
        assert!(result.is_err());
    }
}

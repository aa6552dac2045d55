//! download_file tool - Save a remote file into the workspace

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use serde_json::Value;

use super::{Tool, ToolContext, ToolResult};

pub struct DownloadFileTool;

#[async_trait]
impl Tool for DownloadFileTool {
    fn name(&self) -> &'static str {
        "download_file"
    }

    fn description(&self) -> &'static str {
        "Download a file (CSV, PDF, audio, image, ...) into the working directory so code can read it. \
         Returns the saved path."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL of the file"
                },
                "filename": {
                    "type": "string",
                    "description": "Name to save the file under, relative to the working directory"
                }
            },
            "required": ["url", "filename"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error> {
        let url = input["url"].as_str().ok_or_else(|| eyre!("url is required"))?;
        let filename = input["filename"].as_str().ok_or_else(|| eyre!("filename is required"))?;

        let target = ctx.resolve(filename)?;

        let response = ctx
            .http
            .get(url)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to download {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::error(format!("HTTP {} downloading {}", status, url)));
        }

        let bytes = response.bytes().await.wrap_err("Failed to read download body")?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .wrap_err_with(|| format!("Failed to write {}", target.display()))?;

        Ok(ToolResult::success(format!(
            "Saved {} bytes to {}",
            bytes.len(),
            target.display()
        )))
    }
}

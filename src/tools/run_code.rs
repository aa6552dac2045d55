//! run_code tool - Write a script into the workspace and execute it

use std::process::Stdio;

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use serde_json::Value;
use tokio::process::Command;

use super::{Tool, ToolContext, ToolError, ToolResult};

/// File the submitted code is written to, relative to the workspace
pub const SCRIPT_NAME: &str = "runner.py";

pub struct RunCodeTool;

#[async_trait]
impl Tool for RunCodeTool {
    fn name(&self) -> &'static str {
        "run_code"
    }

    fn description(&self) -> &'static str {
        "Run Python code in the working directory and return stdout/stderr. Downloaded files are in \
         the current directory. Print the values you need."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Complete program source to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error> {
        let code = input["code"].as_str().ok_or_else(|| eyre!("code is required"))?;
        let (program, leading_args) = ctx
            .interpreter
            .split_first()
            .ok_or_else(|| eyre!("no interpreter configured"))?;

        ctx.ensure_workspace().await?;
        let script = ctx.workspace.join(SCRIPT_NAME);
        tokio::fs::write(&script, code)
            .await
            .wrap_err_with(|| format!("Failed to write {}", script.display()))?;

        let timeout_ms = ctx.command_timeout.as_millis() as u64;
        let output = tokio::time::timeout(
            ctx.command_timeout,
            Command::new(program)
                .args(leading_args)
                .arg(SCRIPT_NAME)
                .current_dir(&ctx.workspace)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ToolError::CommandTimeout { timeout_ms })?
        .wrap_err_with(|| format!("Failed to start {}", program))?;

        Ok(format_output(&output, ctx))
    }
}

/// Combine stdout and stderr into a single result, failing on non-zero exit
pub(crate) fn format_output(output: &std::process::Output, ctx: &ToolContext) -> ToolResult {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let combined = if stdout.is_empty() && !stderr.is_empty() {
        stderr.to_string()
    } else if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\n\nSTDERR:\n{}", stdout, stderr)
    };

    let truncated = ctx.truncate(combined);

    if output.status.success() {
        ToolResult::success(truncated)
    } else {
        ToolResult::error(format!(
            "Exit code: {}\n{}",
            output.status.code().unwrap_or(-1),
            truncated
        ))
    }
}

//! add_dependencies tool - Install packages the generated code needs

use std::process::Stdio;

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use serde_json::Value;
use tokio::process::Command;

use super::run_code::format_output;
use super::{Tool, ToolContext, ToolError, ToolResult};

pub struct AddDependenciesTool;

#[async_trait]
impl Tool for AddDependenciesTool {
    fn name(&self) -> &'static str {
        "add_dependencies"
    }

    fn description(&self) -> &'static str {
        "Install Python packages needed by run_code (e.g. pandas, pypdf). Pass package names only."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "dependencies": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Package names to install"
                }
            },
            "required": ["dependencies"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error> {
        let packages = parse_packages(&input)?;
        let (program, leading_args) = ctx
            .installer
            .split_first()
            .ok_or_else(|| eyre!("no installer configured"))?;

        ctx.ensure_workspace().await?;
        log::info!("Installing dependencies: {}", packages.join(", "));

        let timeout_ms = ctx.command_timeout.as_millis() as u64;
        let output = tokio::time::timeout(
            ctx.command_timeout,
            Command::new(program)
                .args(leading_args)
                .args(&packages)
                .current_dir(&ctx.workspace)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ToolError::CommandTimeout { timeout_ms })?
        .wrap_err_with(|| format!("Failed to start {}", program))?;

        let result = format_output(&output, ctx);
        if result.is_error {
            return Ok(result);
        }
        Ok(ToolResult::success(format!("Installed: {}\n{}", packages.join(", "), result.content)))
    }
}

fn parse_packages(input: &Value) -> Result<Vec<String>, ToolError> {
    let list = input["dependencies"].as_array().ok_or_else(|| ToolError::InvalidInput {
        message: "dependencies must be an array of package names".to_string(),
    })?;

    let mut packages = Vec::with_capacity(list.len());
    for item in list {
        let name = item.as_str().map(str::trim).unwrap_or_default();
        if name.is_empty() || name.starts_with('-') {
            return Err(ToolError::InvalidInput {
                message: format!("invalid package name: {}", item),
            });
        }
        packages.push(name.to_string());
    }

    if packages.is_empty() {
        return Err(ToolError::InvalidInput {
            message: "no dependencies given".to_string(),
        });
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_packages() {
        let packages = parse_packages(&serde_json::json!({"dependencies": ["pandas", " numpy "]})).unwrap();
        assert_eq!(packages, vec!["pandas", "numpy"]);
    }

    #[test]
    fn test_parse_packages_rejects_flags() {
        let result = parse_packages(&serde_json::json!({"dependencies": ["--index-url=http://evil"]}));
        assert!(matches!(result, Err(ToolError::InvalidInput { .. })));
    }

    #[test]
    fn test_parse_packages_rejects_empty() {
        assert!(parse_packages(&serde_json::json!({"dependencies": []})).is_err());
        assert!(parse_packages(&serde_json::json!({"dependencies": [""]})).is_err());
        assert!(parse_packages(&serde_json::json!({"dependencies": "pandas"})).is_err());
    }

    #[tokio::test]
    async fn test_install_runs_installer_with_packages() {
        let dir = tempdir().unwrap();
        let mut ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        ctx.installer = vec!["echo".to_string(), "installing".to_string()];

        let result = AddDependenciesTool
            .execute(serde_json::json!({"dependencies": ["pandas", "pypdf"]}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("Installed: pandas, pypdf"));
        assert!(result.content.contains("installing pandas pypdf"));
    }

    #[tokio::test]
    async fn test_install_failure_is_error_result() {
        let dir = tempdir().unwrap();
        let mut ctx = ToolContext::for_workspace(dir.path().to_path_buf());
        ctx.installer = vec!["false".to_string()];

        let result = AddDependenciesTool
            .execute(serde_json::json!({"dependencies": ["nope"]}), &ctx)
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("Exit code: 1"));
    }
}

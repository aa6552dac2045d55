//! Tool execution context - shared HTTP client, workspace, and limits

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use reqwest::Client;

/// Execution context handed to every tool call
#[derive(Clone)]
pub struct ToolContext {
    /// Directory downloads and scripts are written to
    pub workspace: PathBuf,

    /// Shared HTTP client for page fetches, downloads, and posts
    pub http: Client,

    /// Timeout for `run_code` and `add_dependencies`
    pub command_timeout: Duration,

    /// Results longer than this are truncated before reaching the model
    pub max_output_chars: usize,

    /// Program (plus leading args) that runs a script file
    pub interpreter: Vec<String>,

    /// Program (plus leading args) that installs packages
    pub installer: Vec<String>,
}

impl ToolContext {
    pub fn new(workspace: PathBuf, http: Client) -> Self {
        Self {
            workspace,
            http,
            command_timeout: Duration::from_secs(120),
            max_output_chars: 30_000,
            interpreter: vec!["python3".to_string()],
            installer: vec!["pip".to_string(), "install".to_string()],
        }
    }

    /// Context with a default HTTP client (for tests and tooling)
    pub fn for_workspace(workspace: PathBuf) -> Self {
        Self::new(workspace, Client::new())
    }

    /// Resolve a relative file name inside the workspace.
    ///
    /// Absolute paths and `..` components are rejected so tools can only write
    /// below the workspace.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ToolError> {
        let path = Path::new(name);
        if name.trim().is_empty() {
            return Err(ToolError::InvalidInput {
                message: "file name is empty".to_string(),
            });
        }

        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                workspace: self.workspace.clone(),
            });
        }

        Ok(self.workspace.join(path))
    }

    /// Create the workspace directory if needed
    pub async fn ensure_workspace(&self) -> Result<(), ToolError> {
        tokio::fs::create_dir_all(&self.workspace)
            .await
            .map_err(|e| ToolError::IoError {
                operation: format!("create workspace {}", self.workspace.display()),
                source: e,
            })
    }

    /// Truncate long output, noting the original size
    pub fn truncate(&self, text: String) -> String {
        truncate_chars(text, self.max_output_chars)
    }
}

pub(crate) fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}...\n[truncated, {} chars total]",
            &text[..cut],
            text.chars().count()
        ),
        None => text,
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Path {path} escapes workspace {workspace}")]
    SandboxViolation { path: PathBuf, workspace: PathBuf },

    #[error("Command timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("IO error during {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

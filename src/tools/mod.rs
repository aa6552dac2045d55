//! Tool system for the quiz agent
//!
//! Tools give the model its only side effects: fetching pages, downloading
//! files, posting answers, running code, and installing packages. Every call
//! gets the same [`ToolContext`], which owns the HTTP client and workspace.

mod add_dependencies;
mod context;
mod download_file;
mod executor;
mod get_rendered_html;
mod post_request;
mod run_code;

pub use context::{ToolContext, ToolError};
pub use executor::ToolExecutor;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolDefinition;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the function name the model calls)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolResult, eyre::Error>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

pub use add_dependencies::AddDependenciesTool;
pub use download_file::DownloadFileTool;
pub use get_rendered_html::GetRenderedHtmlTool;
pub use post_request::PostRequestTool;
pub use run_code::RunCodeTool;

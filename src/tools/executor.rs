//! Tool executor - manages tool registration and execution

use std::collections::BTreeMap;

use super::{
    AddDependenciesTool, DownloadFileTool, GetRenderedHtmlTool, PostRequestTool, RunCodeTool, Tool, ToolContext,
    ToolResult,
};
use crate::llm::{ToolCall, ToolDefinition};

/// Owns the tool set bound to the model and the context tools run in
pub struct ToolExecutor {
    tools: BTreeMap<String, Box<dyn Tool>>,
    ctx: ToolContext,
}

impl ToolExecutor {
    /// Create executor with the five quiz tools
    pub fn standard(ctx: ToolContext) -> Self {
        let mut executor = Self::new(ctx);
        executor.add_tool(Box::new(RunCodeTool));
        executor.add_tool(Box::new(GetRenderedHtmlTool));
        executor.add_tool(Box::new(DownloadFileTool));
        executor.add_tool(Box::new(PostRequestTool));
        executor.add_tool(Box::new(AddDependenciesTool));
        executor
    }

    /// Create an empty executor (for custom tool sets)
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            tools: BTreeMap::new(),
            ctx,
        }
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool definitions for the LLM, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool call; failures come back as error results
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&tool_call.name) else {
            return ToolResult::error(format!("Unknown tool: {}", tool_call.name));
        };

        match tool.execute(tool_call.input.clone(), &self.ctx).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(format!("Tool error: {:#}", e)),
        }
    }

    /// Execute tool calls in order, one result per call
    pub async fn execute_all(&self, tool_calls: &[ToolCall]) -> Vec<(String, ToolResult)> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            log::info!("Calling tool {} ({})", call.name, call.id);
            let result = self.execute(call).await;
            results.push((call.id.clone(), result));
        }

        results
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

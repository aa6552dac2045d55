//! Loop driver - alternates reasoning and tool execution until END.
//!
//! The driver owns no state between runs. Everything a run needs lives in the
//! [`Conversation`] it is given.

use std::sync::Arc;

use log::{debug, info, warn};

use super::route::{LoopState, Route, route};
use super::state::Conversation;
use crate::error::{AgentError, Result};
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason};
use crate::tools::ToolExecutor;

/// Configuration for the Agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Ceiling on executed steps (reasoning calls plus tool rounds)
    pub max_iterations: usize,
    /// Max output tokens per reasoning call; the client default when unset
    pub max_tokens: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            max_tokens: None,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed (reasoning calls plus tool rounds)
    pub steps: usize,
    /// Reasoning calls made
    pub reasoning_calls: usize,
    /// Tool calls executed
    pub tool_calls: usize,
    /// Final conversation length
    pub messages: usize,
}

/// Drives one conversation through the reasoning/tool loop.
pub struct Agent<L>
where
    L: LlmClient,
{
    /// LLM client for reasoning steps
    llm: Arc<L>,
    /// Tools bound to the model
    tools: ToolExecutor,
    /// Rendered system instructions
    system_prompt: String,
    config: AgentConfig,
}

impl<L> Agent<L>
where
    L: LlmClient,
{
    pub fn new(llm: Arc<L>, tools: ToolExecutor, system_prompt: impl Into<String>) -> Self {
        Self::with_config(llm, tools, system_prompt, AgentConfig::default())
    }

    pub fn with_config(
        llm: Arc<L>,
        tools: ToolExecutor,
        system_prompt: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt: system_prompt.into(),
            config,
        }
    }

    /// Solve the quiz chain starting at `start_url`.
    pub async fn run(&self, start_url: &str) -> Result<RunSummary> {
        let mut conversation = Conversation::seeded(start_url);
        info!("Starting run at {} with model {}", start_url, self.llm.model());
        debug!("Tools bound: {}", self.tools.tool_names().join(", "));
        self.drive(&mut conversation).await
    }

    /// Run the state machine over an existing conversation until it terminates.
    pub async fn drive(&self, conversation: &mut Conversation) -> Result<RunSummary> {
        let mut state = LoopState::Reasoning;
        let mut summary = RunSummary::default();

        while !state.is_terminal() {
            state = match state {
                LoopState::Reasoning => {
                    self.take_step(&mut summary)?;
                    self.reason(conversation).await?;
                    summary.reasoning_calls += 1;
                    LoopState::Dispatch
                }
                LoopState::Dispatch => {
                    let next = conversation.last().map(route).unwrap_or(Route::Reason);
                    debug!("Dispatch -> {}", next.as_str());
                    LoopState::from_route(next)
                }
                LoopState::ToolExec => {
                    self.take_step(&mut summary)?;
                    summary.tool_calls += self.execute_tools(conversation).await;
                    LoopState::Reasoning
                }
                LoopState::Terminated => LoopState::Terminated,
            };
        }

        summary.messages = conversation.len();
        info!(
            "Tasks completed successfully: {} steps, {} tool calls, {} messages",
            summary.steps, summary.tool_calls, summary.messages
        );
        Ok(summary)
    }

    fn take_step(&self, summary: &mut RunSummary) -> Result<()> {
        if summary.steps >= self.config.max_iterations {
            warn!("Step ceiling of {} reached", self.config.max_iterations);
            return Err(AgentError::Exhausted {
                limit: self.config.max_iterations,
            });
        }
        summary.steps += 1;
        Ok(())
    }

    /// Reasoning step: send the full history, append exactly one reply.
    pub async fn reason(&self, conversation: &mut Conversation) -> Result<()> {
        let mut request = CompletionRequest::new(self.system_prompt.clone())
            .with_messages(conversation.messages().to_vec())
            .with_tools(self.tools.definitions());
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(request).await?;

        match response.stop_reason {
            StopReason::MaxTokens => warn!("Reply truncated at the output token limit"),
            StopReason::Safety => warn!("Reply stopped by the provider's safety filter"),
            _ => {}
        }
        debug!(
            "Reply with {} tool call(s), {} tokens",
            response.message.tool_calls.len(),
            response.usage.total()
        );

        conversation.push(Message::Assistant(response.message));
        Ok(())
    }

    /// Tool execution step: one result message per pending call, in call order.
    ///
    /// Returns the number of calls executed.
    pub async fn execute_tools(&self, conversation: &mut Conversation) -> usize {
        let calls = conversation.pending_tool_calls().to_vec();
        let results = self.tools.execute_all(&calls).await;

        for (call, (call_id, result)) in calls.iter().zip(results) {
            if result.is_error {
                warn!("Tool {} failed: {}", call.name, first_line(&result.content));
            }
            conversation.push(Message::tool_result(call_id, &call.name, result.content, result.is_error));
        }

        calls.len()
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

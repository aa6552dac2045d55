//! Dispatch: choose the next loop state from the latest message.

use crate::llm::{Message, MessageContent};

/// Text that ends the loop when it is the whole (trimmed) reply.
pub const TERMINATION_MARKER: &str = "END";

/// Outcome of dispatch on the latest message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the requested tool calls.
    Tools,
    /// Ask the model again.
    Reason,
    /// Stop the loop.
    End,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::Reason => "reason",
            Self::End => "end",
        }
    }
}

/// States of the loop driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Reasoning,
    Dispatch,
    ToolExec,
    Terminated,
}

impl LoopState {
    /// State entered after dispatch picks `route`.
    pub fn from_route(route: Route) -> Self {
        match route {
            Route::Tools => LoopState::ToolExec,
            Route::Reason => LoopState::Reasoning,
            Route::End => LoopState::Terminated,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Terminated)
    }
}

/// Decide where the loop goes after `latest`.
///
/// Tool calls win over any text. Otherwise the reply ends the loop only if its
/// content is the termination marker; list content is checked at its first
/// block. Anything else, including empty or missing content and non-assistant
/// messages, goes back to reasoning.
pub fn route(latest: &Message) -> Route {
    let Some(reply) = latest.as_assistant() else {
        return Route::Reason;
    };

    if reply.has_tool_calls() {
        return Route::Tools;
    }

    match &reply.content {
        Some(content) if is_termination_marker(content) => Route::End,
        _ => Route::Reason,
    }
}

/// Whether `content` is exactly the termination marker, ignoring surrounding whitespace.
pub fn is_termination_marker(content: &MessageContent) -> bool {
    let text = match content {
        MessageContent::Text(text) => Some(text.as_str()),
        MessageContent::Blocks(blocks) => blocks.first().and_then(|block| block.as_text()),
    };

    text.is_some_and(|t| t.trim() == TERMINATION_MARKER)
}

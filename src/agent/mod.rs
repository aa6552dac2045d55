//! Agent loop - reasoning, dispatch, and tool execution over one conversation
//!
//! This module provides:
//! - Conversation, the append-only message history
//! - route, the dispatch decision on the latest message
//! - Agent, the driver that alternates reasoning and tool execution

mod driver;
mod route;
mod state;

pub use driver::{Agent, AgentConfig, RunSummary};
pub use route::{LoopState, Route, TERMINATION_MARKER, is_termination_marker, route};
pub use state::Conversation;

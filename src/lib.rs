//! Quizloop - an LLM agent that solves chained web quizzes
//!
//! The agent loads a quiz page, works out the answer with its tools, submits it,
//! and follows whatever URL the server hands back until the chain ends.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod tools;

pub use error::{AgentError, Result};

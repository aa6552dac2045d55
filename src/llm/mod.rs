//! LLM Client Layer - Gemini API integration with rate limiting
//!
//! This module provides:
//! - Conversation message types
//! - LlmClient trait for API abstraction
//! - GeminiClient implementation
//! - A token-bucket rate limiter and a rate-limited client wrapper

pub mod client;
pub mod gemini;
pub mod rate_limit;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient};
pub use gemini::{GeminiClient, GeminiConfig};
pub use rate_limit::{RateLimitConfig, RateLimitedClient, RateLimiter};
pub use types::{
    AssistantMessage, CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, Role, StopReason,
    ToolCall, ToolDefinition, ToolResultMessage, Usage,
};

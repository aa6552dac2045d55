//! Prompt System - the quiz agent's system instructions
//!
//! The built-in template can be replaced by a file named in the config. Either
//! way it is rendered once at startup with the run's credentials.

mod render;
mod system;

pub use render::PromptRenderer;
pub use system::{SYSTEM_TEMPLATE, build_system_prompt};

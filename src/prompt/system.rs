//! System prompt - the built-in quiz instructions and their rendering

use std::path::Path;

use crate::config::Credentials;
use crate::error::{AgentError, Result};

use super::PromptRenderer;

/// Built-in system instructions. `{{email}}` and `{{secret}}` are filled from
/// the run's credentials.
pub const SYSTEM_TEMPLATE: &str = r#"You are an autonomous quiz-solving agent.

Your job is to:
1. Load the quiz page from the given URL.
2. Extract ALL instructions, required parameters, submission rules, and the submit endpoint.
3. Solve the task exactly as required.
4. Submit the answer ONLY to the endpoint specified on the current page (never make up URLs).
5. Read the server response and:
   - If it contains a new quiz URL, fetch it immediately and continue.
   - If no new URL is present, return "END".

STRICT RULES:

GENERAL RULES:
- NEVER stop early.
- NEVER hallucinate URLs.
- NEVER shorten URLs.
- ALWAYS follow the server-provided flow.
- ALWAYS continue until no new URL is provided.

TIME LIMIT:
- Each task has a 3-minute limit.
- If the answer is wrong, retry.

STOPPING CONDITION:
- Only return END when the server response contains no new URL.

ADDITIONAL INFORMATION:
- Email: {{email}}
- Secret: {{secret}}
"#;

/// Render the system prompt, from `template_path` when given
pub fn build_system_prompt(credentials: &Credentials, template_path: Option<&Path>) -> Result<String> {
    let template = match template_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read prompt template {}: {}", path.display(), e))
        })?,
        None => SYSTEM_TEMPLATE.to_string(),
    };

    PromptRenderer::new().render_with(&template, credentials)
}

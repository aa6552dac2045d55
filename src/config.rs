use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AgentError;
use crate::llm::{GeminiConfig, RateLimitConfig};
use crate::tools::ToolContext;

/// Environment variable holding the quiz account email
pub const EMAIL_VAR: &str = "EMAIL";
/// Environment variable holding the quiz secret
pub const SECRET_VAR: &str = "SECRET";
/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitSettings,
    pub agent: AgentSettings,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: String,
    pub max_output_tokens: u32,
    pub timeout_ms: u64,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        Self {
            model: gemini.model,
            api_base: gemini.api_base,
            max_output_tokens: gemini.max_tokens,
            timeout_ms: 300000,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub requests_per_second: f64,
    pub check_every_ms: u64,
    pub max_bucket_size: f64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_second: 9.0 / 60.0,
            check_every_ms: 1000,
            max_bucket_size: 9.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub prompt_template: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            prompt_template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub workspace_dir: PathBuf,
    pub http_timeout_ms: u64,
    pub command_timeout_ms: u64,
    pub max_output_chars: usize,
    pub interpreter: Vec<String>,
    pub installer: Vec<String>,
    pub user_agent: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("LLMFiles"),
            http_timeout_ms: 60000,
            command_timeout_ms: 120000,
            max_output_chars: 30000,
            interpreter: vec!["python3".to_string()],
            installer: vec!["pip".to_string(), "install".to_string()],
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            rate_limit: RateLimitSettings::default(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.llm.model.clone(),
            api_base: self.llm.api_base.clone(),
            max_tokens: self.llm.max_output_tokens,
            temperature: self.llm.temperature,
            timeout: Duration::from_millis(self.llm.timeout_ms),
        }
    }

    /// Rate limiter settings; fails when they could never release a request
    pub fn rate_limit_config(&self) -> Result<RateLimitConfig> {
        let config = RateLimitConfig {
            requests_per_second: self.rate_limit.requests_per_second,
            check_every: Duration::from_millis(self.rate_limit.check_every_ms),
            max_bucket_size: self.rate_limit.max_bucket_size,
        };
        config.validate().context("Invalid rate_limit settings")?;
        Ok(config)
    }

    /// Build the context every tool call runs in
    pub fn tool_context(&self) -> Result<ToolContext> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(self.tools.http_timeout_ms))
            .user_agent(&self.tools.user_agent)
            .build()
            .context("Failed to create HTTP client for tools")?;

        let mut ctx = ToolContext::new(self.tools.workspace_dir.clone(), http);
        ctx.command_timeout = Duration::from_millis(self.tools.command_timeout_ms);
        ctx.max_output_chars = self.tools.max_output_chars;
        ctx.interpreter = self.tools.interpreter.clone();
        ctx.installer = self.tools.installer.clone();
        Ok(ctx)
    }
}

/// Credentials read from the environment once at startup
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
    #[serde(skip)]
    pub api_key: String,
}

impl Credentials {
    /// Read `EMAIL`, `SECRET`, and `GEMINI_API_KEY` from the process environment
    pub fn from_env() -> std::result::Result<Self, AgentError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AgentError::MissingCredential(name.to_string()))
        };

        Ok(Self {
            email: require(EMAIL_VAR)?,
            secret: require(SECRET_VAR)?,
            api_key: require(API_KEY_VAR)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

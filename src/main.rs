use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use quizloop::agent::{Agent, AgentConfig};
use quizloop::config::{Config, Credentials};
use quizloop::llm::{GeminiClient, LlmClient, RateLimitedClient, RateLimiter};
use quizloop::prompt::build_system_prompt;
use quizloop::tools::ToolExecutor;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("quizloop.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let filters = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| level.map(str::to_string))
        .unwrap_or_else(|| "info".to_string());

    env_logger::Builder::new()
        .parse_filters(&filters)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        match &cli.config {
            Some(path) => println!("{} {}", "Config:".yellow(), path.display()),
            None => println!("{}", "Config: default search path".yellow()),
        }
    }

    match &cli.command {
        Commands::Run {
            url,
            max_iterations,
            model,
        } => handle_run_command(url, *max_iterations, model.clone(), config, cli.is_verbose()).await,
        Commands::Tools => handle_tools_command(&config),
    }
}

async fn handle_run_command(
    url: &str,
    max_iterations: Option<usize>,
    model: Option<String>,
    mut config: Config,
    verbose: bool,
) -> Result<()> {
    if let Some(limit) = max_iterations {
        config.agent.max_iterations = limit;
    }
    if let Some(model) = model {
        config.llm.model = model;
    }

    let credentials = Credentials::from_env().context("Failed to read credentials")?;
    let system_prompt = build_system_prompt(&credentials, config.agent.prompt_template.as_deref())
        .context("Failed to build system prompt")?;

    let gemini = GeminiClient::with_api_key(credentials.api_key.clone(), config.gemini_config())
        .context("Failed to create Gemini client")?;
    let limiter = RateLimiter::new(config.rate_limit_config()?);
    let llm = Arc::new(RateLimitedClient::new(gemini, limiter));

    let ctx = config.tool_context()?;
    ctx.ensure_workspace().await.context("Failed to create tool workspace")?;
    let tools = ToolExecutor::standard(ctx);

    let agent_config = AgentConfig {
        max_iterations: config.agent.max_iterations,
        max_tokens: Some(config.llm.max_output_tokens),
    };

    info!("Running quiz chain from {} with {}", url, llm.model());
    let agent = Agent::with_config(llm.clone(), tools, system_prompt, agent_config);
    let summary = match agent.run(url).await {
        Ok(summary) => summary,
        Err(e) if e.is_exhausted() => {
            println!("{}", "Step ceiling reached; raise --max-iterations to let the run go further".yellow());
            return Err(e).context("Quiz run failed");
        }
        Err(e) => return Err(e).context("Quiz run failed"),
    };

    println!("{}", "Tasks completed successfully".green());

    if verbose {
        let usage = llm.inner().total_usage();
        println!("  {} {}", "Steps:".cyan(), summary.steps);
        println!("  {} {}", "Reasoning calls:".cyan(), summary.reasoning_calls);
        println!("  {} {}", "Tool calls:".cyan(), summary.tool_calls);
        println!("  {} {}", "Messages:".cyan(), summary.messages);
        println!(
            "  {} {} in / {} out",
            "Tokens:".cyan(),
            usage.input_tokens,
            usage.output_tokens
        );
    }

    Ok(())
}

fn handle_tools_command(config: &Config) -> Result<()> {
    let tools = ToolExecutor::standard(config.tool_context()?);

    for definition in tools.definitions() {
        println!("{}", definition.name.green().bold());
        println!("  {}", definition.description);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values in .env fill in anything the shell did not export
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the configured level is known
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}

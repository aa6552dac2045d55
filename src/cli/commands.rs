//! CLI command definitions using clap.
//!
//! - run: solve a quiz chain starting at a URL
//! - tools: list the tools bound to the model

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quizloop - an LLM agent that solves chained web quizzes
#[derive(Parser, Debug)]
#[command(name = "quizloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve the quiz chain starting at URL
    Run {
        /// First quiz page
        url: String,

        /// Step ceiling for the run (overrides config)
        #[arg(short = 'n', long)]
        max_iterations: Option<usize>,

        /// Gemini model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools available to the model
    Tools,
}

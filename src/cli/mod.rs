//! CLI module for quizloop - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;

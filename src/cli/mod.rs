//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ExecuteCommand, ListCommand, ValidateCommand};
use std::ffi::OsString;

/// Performance scenario runner
#[derive(Debug, Parser, Clone)]
#[command(name = "perf-runner")]
#[command(author = "perf-runner contributors")]
#[command(version)]
#[command(about = "Runs performance scenarios: generate, build, profile, collect, clean up", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the scenarios matching a name filter
    Execute(ExecuteCommand),

    /// List scenarios and whether they run on this host
    List(ListCommand),

    /// Validate a scenario catalog
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

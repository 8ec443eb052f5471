//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run scenarios
#[derive(Debug, Args, Clone)]
pub struct ExecuteCommand {
    /// Glob over scenario names (`*` and `?`); empty runs everything
    #[arg(long, alias = "pipelineNameFilter", default_value = "")]
    pub pipeline_name_filter: String,

    /// Scenario catalog YAML (built-in catalog when omitted)
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Where collected artifacts are moved to
    #[arg(long, default_value = "Results")]
    pub results_dir: PathBuf,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// List scenarios
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Scenario catalog YAML (built-in catalog when omitted)
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a scenario catalog
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Scenario catalog YAML
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

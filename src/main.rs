use anyhow::{Context, Result};
use perf_runner::cli::commands::{ExecuteCommand, ListCommand, ValidateCommand};
use perf_runner::cli::output::*;
use perf_runner::cli::{Cli, Command};
use perf_runner::core::config::CatalogConfig;
use perf_runner::execution::PipelinesRunner;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let code = match &cli.command {
        Command::Execute(cmd) => execute(cmd).await?,
        Command::List(cmd) => list_scenarios(cmd)?,
        Command::Validate(cmd) => validate_catalog(cmd)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<CatalogConfig> {
    match path {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => CatalogConfig::builtin(),
    }
}

async fn execute(cmd: &ExecuteCommand) -> Result<i32> {
    let catalog = load_catalog(cmd.catalog.as_deref())?;

    let results_dir = std::env::current_dir()?.join(&cmd.results_dir);
    tokio::fs::create_dir_all(&results_dir)
        .await
        .with_context(|| format!("Failed to create {}", results_dir.display()))?;

    let mut runner = PipelinesRunner::new().with_results_dir(&results_dir);
    catalog
        .register(&mut runner)
        .context("Failed to register scenarios")?;
    debug!(
        "Registered {} scenarios, results go to {}",
        runner.registry().len(),
        results_dir.display()
    );

    if !cmd.json {
        println!("{}", banner());
        println!(
            "{} Host: {}  Filter: {}",
            INFO,
            style(runner.host()).cyan(),
            style(if cmd.pipeline_name_filter.is_empty() {
                "<all>"
            } else {
                cmd.pipeline_name_filter.as_str()
            })
            .cyan()
        );
        let reporter = Arc::new(ConsoleReporter::new());
        runner.add_event_handler(move |event| reporter.handle(&event));
    }

    let report = runner.run(&cmd.pipeline_name_filter).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_summary(&report));
    }

    Ok(report.exit_code())
}

fn list_scenarios(cmd: &ListCommand) -> Result<i32> {
    let catalog = load_catalog(cmd.catalog.as_deref())?;
    let mut runner = PipelinesRunner::new();
    catalog.register(&mut runner)?;

    if cmd.json {
        let scenarios: Vec<_> = runner
            .scenarios()
            .into_iter()
            .map(|(group, scenario, runnable)| {
                serde_json::json!({
                    "group": group,
                    "scenario": scenario,
                    "runnable": runnable,
                })
            })
            .collect();
        let data = serde_json::json!({ "host": runner.host(), "scenarios": scenarios });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    println!("{} Scenarios (host: {}):", INFO, style(runner.host()).cyan());
    for (group, scenario, runnable) in runner.scenarios() {
        let marker = if runnable { CHECK } else { SKIP };
        println!(
            "  {} {} {}",
            marker,
            style(scenario).bold(),
            style(format!("[{}]", group)).dim()
        );
    }

    Ok(0)
}

fn validate_catalog(cmd: &ValidateCommand) -> Result<i32> {
    println!("{} Validating catalog...", INFO);

    match CatalogConfig::from_file(&cmd.catalog) {
        Ok(config) => {
            println!("{} Catalog is valid!", CHECK);
            if let Some(name) = &config.name {
                println!("  Name: {}", style(name).bold());
            }
            println!("  Scenarios: {}", style(config.scenarios.len()).cyan());
            println!("  Steps: {}", style(config.step_count()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(0)
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            Ok(1)
        }
    }
}

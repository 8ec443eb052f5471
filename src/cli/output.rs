//! CLI output formatting

use crate::core::pipeline::PipelineEvent;
use crate::execution::{RunEvent, RunOutcome, RunReport, ScenarioStatus};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Tool banner printed before a run
pub fn banner() -> String {
    format!(
        "{} {} {}",
        ROCKET,
        style("perf-runner").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    )
}

/// Horizontal rule spanning the terminal width
pub fn separator() -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80);
    "─".repeat(width)
}

/// Spinner shown while a step runs
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// One-line rendering of a runner event
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::ScenarioStarted {
            group,
            scenario,
            total_steps,
        } => format!(
            "{} {} {} ({} steps)",
            ROCKET,
            style(scenario).bold(),
            style(format!("[{}]", group)).dim(),
            total_steps
        ),
        RunEvent::Step { event, .. } => match event {
            PipelineEvent::StepStarted { index, step, .. } => {
                format!("{} [{}] {}", SPINNER, index + 1, style(step).cyan())
            }
            PipelineEvent::StepFinished { record, .. } => {
                let elapsed = style(format_duration(record.elapsed)).dim();
                if record.succeeded() {
                    format!(
                        "{} [{}] {} {} {}",
                        CHECK,
                        record.index + 1,
                        style(&record.step).green(),
                        elapsed,
                        style(&record.outcome.message).dim()
                    )
                } else {
                    format!(
                        "{} [{}] {} {}: {}",
                        CROSS,
                        record.index + 1,
                        style(&record.step).red(),
                        elapsed,
                        record.outcome.message
                    )
                }
            }
        },
        RunEvent::ScenarioFinished {
            scenario,
            status,
            message,
            ..
        } => match status {
            ScenarioStatus::Passed => format!(
                "{} {} {}",
                CHECK,
                style(scenario).bold(),
                style("passed").green()
            ),
            _ => format!(
                "{} {} {} {}",
                CROSS,
                style(scenario).bold(),
                style("failed").red(),
                style(message.as_deref().unwrap_or("")).dim()
            ),
        },
        RunEvent::ScenarioSkipped { scenario, host, .. } => format!(
            "{} {} {}",
            SKIP,
            style(scenario).bold(),
            style(format!("skipped (not supported on {})", host)).dim()
        ),
    }
}

/// Prints runner events, with a spinner for the step in flight
#[derive(Default)]
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &RunEvent) {
        let mut spinner = match self.spinner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match event {
            RunEvent::Step {
                event: PipelineEvent::StepStarted { .. },
                ..
            } => {
                if let Some(previous) = spinner.take() {
                    previous.finish_and_clear();
                }
                *spinner = Some(create_spinner(format_run_event(event)));
            }
            _ => {
                if let Some(current) = spinner.take() {
                    current.finish_and_clear();
                }
                println!("{}", format_run_event(event));
            }
        }
    }
}

/// End-of-run summary
pub fn format_summary(report: &RunReport) -> String {
    let mut lines = vec![separator()];

    for entry in &report.scenarios {
        let (icon, status) = match entry.status {
            ScenarioStatus::Passed => (CHECK, style("passed").green()),
            ScenarioStatus::Failed => (CROSS, style("failed").red()),
            ScenarioStatus::Skipped => (SKIP, style("skipped").dim()),
        };
        lines.push(format!(
            "{} {:<40} {} {}",
            icon,
            entry.scenario,
            status,
            style(format_duration(Duration::from_millis(entry.elapsed_ms))).dim()
        ));
    }

    let verdict = match report.outcome() {
        RunOutcome::AllPassed => format!("{} {}", CHECK, style("All scenarios passed").green()),
        RunOutcome::SomeFailed { failed } => format!(
            "{} {}",
            CROSS,
            style(format!("{} scenario(s) failed", failed)).red()
        ),
        RunOutcome::NoScenariosMatched => format!(
            "{} {}",
            WARN,
            style(format!(
                "No scenarios matched '{}' on {}",
                report.filter, report.host
            ))
            .yellow()
        ),
    };

    lines.push(format!(
        "{} passed, {} failed, {} skipped (platform)",
        style(report.passed()).green(),
        style(report.failed()).red(),
        style(report.skipped_platform()).dim()
    ));
    lines.push(verdict);
    lines.join("\n")
}

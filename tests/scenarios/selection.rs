//! Test: Selection - name filtering and platform gating

use crate::helpers::*;
use perf_runner::core::Platform;
use perf_runner::execution::{PipelinesRunner, RunOutcome, ScenarioStatus};

fn sample_runner(journal: &Journal, host: Platform) -> PipelinesRunner {
    let mut runner = runner_on(host);
    runner
        .add_pipeline("Default", "Scenario1_PerfView", &[Platform::Windows], scenario_of(journal, &[("profile", true)]))
        .unwrap();
    runner
        .add_pipeline("Default", "Scenario1_PlainProcess", &Platform::all(), scenario_of(journal, &[("profile", true)]))
        .unwrap();
    runner
        .add_pipeline("Default", "Scenario2_DotnetTrace", &Platform::all(), scenario_of(journal, &[("profile", true)]))
        .unwrap();
    runner
}

/// An empty filter runs every eligible scenario once, in registration order
#[tokio::test]
async fn test_empty_filter_runs_everything_once() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::Windows);

    let report = runner.run("").await.unwrap();

    assert_eq!(report.outcome(), RunOutcome::AllPassed);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        journal.entries().into_iter().filter(|e| e.starts_with("run:")).collect::<Vec<_>>(),
        vec![
            "run:Scenario1_PerfView/profile",
            "run:Scenario1_PlainProcess/profile",
            "run:Scenario2_DotnetTrace/profile",
        ]
    );
}

/// On Linux `Scenario1_*` runs only the cross-platform scenario; the
/// Windows-only one is reported as skipped and the other prefix never shows
#[tokio::test]
async fn test_glob_with_platform_gate() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::Linux);

    let report = runner.run("Scenario1_*").await.unwrap();

    assert_eq!(
        statuses(&report),
        vec![
            ("Scenario1_PerfView".to_string(), ScenarioStatus::Skipped),
            ("Scenario1_PlainProcess".to_string(), ScenarioStatus::Passed),
        ]
    );
    assert_eq!(report.executed(), 1);
    assert_eq!(report.skipped_platform(), 1);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(journal.count("run:Scenario1_PerfView"), 0);
    assert_eq!(journal.count("run:Scenario2_"), 0);
}

/// A filter matching nothing is reported distinctly
#[tokio::test]
async fn test_no_match() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::Linux);

    let report = runner.run("Scenario9_*").await.unwrap();

    assert!(report.scenarios.is_empty());
    assert_eq!(report.outcome(), RunOutcome::NoScenariosMatched);
    assert_eq!(report.exit_code(), 2);
    assert!(journal.entries().is_empty());
}

/// Matching only scenarios that cannot run here counts as no match
#[tokio::test]
async fn test_only_unsupported_matches() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::MacOs);

    let report = runner.run("*PerfView").await.unwrap();

    assert_eq!(report.skipped_platform(), 1);
    assert_eq!(report.outcome(), RunOutcome::NoScenariosMatched);
    assert_eq!(report.exit_code(), 2);
}

/// Exact names and `?` wildcards select single scenarios
#[tokio::test]
async fn test_exact_and_single_char_filters() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::Windows);

    let exact = runner.run("Scenario2_DotnetTrace").await.unwrap();
    assert_eq!(exact.executed(), 1);

    let single = runner.run("Scenario?_PlainProcess").await.unwrap();
    assert_eq!(single.executed(), 1);
    assert_eq!(single.scenarios[0].scenario, "Scenario1_PlainProcess");

    let case_sensitive = runner.run("scenario1_*").await.unwrap();
    assert_eq!(case_sensitive.outcome(), RunOutcome::NoScenariosMatched);
}

/// An unrecognized host runs nothing, not even scenarios declared for all platforms
#[tokio::test]
async fn test_unknown_host_runs_nothing() {
    let journal = Journal::new();
    let mut runner = sample_runner(&journal, Platform::Other);
    runner
        .add_pipeline("Default", "Scenario1_Anywhere", &[Platform::Other], scenario_of(&journal, &[("profile", true)]))
        .unwrap();

    let report = runner.run("").await.unwrap();

    assert_eq!(report.skipped_platform(), 4);
    assert_eq!(report.outcome(), RunOutcome::NoScenariosMatched);
    assert_eq!(report.exit_code(), 2);
    assert!(journal.entries().is_empty());
}

/// A filter that cannot be compiled is reported, not treated as "no match"
#[tokio::test]
async fn test_uncompilable_filter_is_an_error() {
    let journal = Journal::new();
    let runner = sample_runner(&journal, Platform::Linux);

    let err = runner.run(&"?".repeat(500_000)).await.unwrap_err();

    assert!(err.to_string().starts_with("Invalid scenario filter"));
    assert!(journal.entries().is_empty());
}

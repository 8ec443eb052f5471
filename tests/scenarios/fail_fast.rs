//! Test: Fail Fast - a failing step stops its pipeline

use crate::helpers::*;
use perf_runner::core::{ParameterBag, Platform, PipelineStatus};
use perf_runner::execution::{ScenarioStatus, RunOutcome};

/// Steps after a failure are never constructed nor executed
#[tokio::test]
async fn test_failure_stops_chain() {
    let journal = Journal::new();
    let pipeline = chain(
        ParameterBag::new(),
        vec![
            passing("build", &journal),
            failing("profile", &journal),
            passing("collect", &journal),
        ],
    );

    let result = pipeline.run().await;

    assert_eq!(result.status, PipelineStatus::Failed);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.failure().unwrap().step, "profile");
    assert_eq!(
        journal.entries(),
        vec!["build:build", "run:build", "build:profile", "run:profile"]
    );
    assert_eq!(journal.count("build:collect"), 0);
    assert_eq!(journal.count("run:collect"), 0);
}

/// A failing first step leaves everything else untouched
#[tokio::test]
async fn test_first_step_failure() {
    let journal = Journal::new();
    let pipeline = chain(
        ParameterBag::new(),
        vec![failing("generate", &journal), passing("build", &journal)],
    );

    let result = pipeline.run().await;

    assert!(!result.is_success());
    assert_eq!(result.records.len(), 1);
    assert_eq!(journal.count("build:build"), 0);
}

/// A step that reads a missing key fails its pipeline instead of panicking
#[tokio::test]
async fn test_missing_key_is_a_failure() {
    let journal = Journal::new();
    let pipeline = chain(
        ParameterBag::new(),
        vec![reading("profile", "target_binary", &journal), passing("after", &journal)],
    );

    let result = pipeline.run().await;

    assert!(!result.is_success());
    let failure = result.failure().unwrap();
    assert_eq!(failure.step, "profile");
    assert!(failure.outcome.message.contains("target_binary"));
    assert_eq!(journal.count("run:after"), 0);
}

/// A failing scenario does not stop the scenarios registered after it
#[tokio::test]
async fn test_failed_scenario_does_not_stop_run() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux);
    runner
        .add_pipeline("Default", "Broken", &Platform::all(), scenario_of(&journal, &[("a", true), ("b", false), ("c", true)]))
        .unwrap();
    runner
        .add_pipeline("Default", "Healthy", &Platform::all(), scenario_of(&journal, &[("a", true)]))
        .unwrap();

    let report = runner.run("").await.unwrap();

    assert_eq!(
        statuses(&report),
        vec![
            ("Broken".to_string(), ScenarioStatus::Failed),
            ("Healthy".to_string(), ScenarioStatus::Passed),
        ]
    );
    assert_eq!(report.outcome(), RunOutcome::SomeFailed { failed: 1 });
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.scenario("Broken").unwrap().message.as_deref(), Some("Broken/b: Broken/b failed"));
    assert_eq!(journal.count("run:Broken/c"), 0);
    assert_eq!(journal.count("run:Healthy/a"), 1);
}

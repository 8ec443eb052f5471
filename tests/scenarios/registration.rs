//! Test: Registration - duplicate and invalid scenario definitions

use crate::helpers::*;
use perf_runner::core::Platform;
use perf_runner::execution::RegistryError;

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux);
    runner
        .add_pipeline("Default", "Scenario1_PlainProcess", &Platform::all(), scenario_of(&journal, &[("first", true)]))
        .unwrap();

    let err = runner
        .add_pipeline("Default", "Scenario1_PlainProcess", &Platform::all(), scenario_of(&journal, &[("second", true)]))
        .unwrap_err();

    assert_eq!(
        err,
        RegistryError::DuplicateScenario {
            group: "Default".to_string(),
            scenario: "Scenario1_PlainProcess".to_string(),
        }
    );

    // The first definition is the one that runs
    let report = runner.run("").await.unwrap();
    assert_eq!(report.scenarios.len(), 1);
    assert_eq!(journal.count("run:Scenario1_PlainProcess/first"), 1);
    assert_eq!(journal.count("run:Scenario1_PlainProcess/second"), 0);
}

#[test]
fn test_scenarios_listing_reports_eligibility() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux);
    runner
        .add_pipeline("Windows", "Scenario1_PerfView", &[Platform::Windows], scenario_of(&journal, &[("p", true)]))
        .unwrap();
    runner
        .add_pipeline("Default", "Scenario1_PlainProcess", &[Platform::Linux, Platform::MacOs], scenario_of(&journal, &[("p", true)]))
        .unwrap();

    assert_eq!(
        runner.scenarios(),
        vec![
            ("Windows", "Scenario1_PerfView", false),
            ("Default", "Scenario1_PlainProcess", true),
        ]
    );
}

#[test]
fn test_no_platforms_rejected() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux);
    let err = runner
        .add_pipeline("Default", "Nowhere", &[], scenario_of(&journal, &[("p", true)]))
        .unwrap_err();
    assert_eq!(err, RegistryError::NoPlatforms("Nowhere".to_string()));
    assert!(runner.registry().is_empty());
}

//! Test: Success Chain - ordered execution and bag propagation

use crate::helpers::*;
use perf_runner::core::{ParameterBag, Platform, PipelineStatus};
use perf_runner::execution::ScenarioStatus;

/// Steps run in chain order and each runs once
#[tokio::test]
async fn test_steps_run_in_order() {
    let journal = Journal::new();
    let pipeline = chain(
        ParameterBag::new(),
        vec![
            passing("generate", &journal),
            passing("build", &journal),
            passing("profile", &journal),
            passing("move", &journal),
            passing("cleanup", &journal),
        ],
    );

    let result = pipeline.run().await;

    assert_eq!(result.status, PipelineStatus::Succeeded);
    let order: Vec<&str> = result.records.iter().map(|r| r.step.as_str()).collect();
    assert_eq!(order, vec!["generate", "build", "profile", "move", "cleanup"]);
    let indices: Vec<usize> = result.records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(journal.count("run:"), 5);
}

/// Writes of step N are visible to step N+1
#[tokio::test]
async fn test_bag_flows_between_steps() {
    let journal = Journal::new();
    let pipeline = chain(
        ParameterBag::new(),
        vec![
            writing("build", "target_binary", "/tmp/app", &journal),
            reading("profile", "target_binary", &journal),
        ],
    );

    let result = pipeline.run().await;

    assert!(result.is_success());
    assert!(journal.entries().contains(&"saw:profile:/tmp/app".to_string()));
    assert_eq!(result.bag.get_text("target_binary"), Ok("/tmp/app"));
}

/// Initial bag contents reach the first step
#[tokio::test]
async fn test_initial_bag_is_visible() {
    let journal = Journal::new();
    let mut bag = ParameterBag::new();
    bag.set("configuration", "release");

    let result = chain(bag, vec![reading("build", "configuration", &journal)])
        .run()
        .await;

    assert!(result.is_success());
    assert_eq!(journal.entries()[2], "saw:build:release");
}

/// Every run of a scenario starts from a fresh bag
#[tokio::test]
async fn test_runs_do_not_share_bags() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux);
    let writer_journal = journal.clone();
    runner
        .add_pipeline("Default", "Scenario1_PlainProcess", &Platform::all(), move |bag| {
            let leaked = bag.contains_key("leak");
            writer_journal.record(format!("fresh:{}", !leaked));
            chain(bag, vec![writing("write", "leak", "yes", &writer_journal)])
        })
        .unwrap();

    let first = runner.run("").await.unwrap();
    let second = runner.run("").await.unwrap();

    assert_eq!(first.exit_code(), 0);
    assert_eq!(second.exit_code(), 0);
    assert_eq!(journal.count("fresh:true"), 2);
    assert_ne!(
        first.scenarios[0].run_id,
        second.scenarios[0].run_id,
        "each run gets its own id"
    );
}

/// The runner seeds the scenario name and results directory
#[tokio::test]
async fn test_runner_seeds_bag() {
    let journal = Journal::new();
    let mut runner = runner_on(Platform::Linux).with_results_dir("/tmp/perf-results");
    let seen = journal.clone();
    runner
        .add_pipeline("Default", "Scenario1_Seeded", &Platform::all(), move |bag| {
            seen.record(format!(
                "{}|{}",
                bag.scenario().unwrap(),
                bag.results_dir().unwrap().display()
            ));
            chain(bag, vec![passing("noop", &seen)])
        })
        .unwrap();

    let report = runner.run("").await.unwrap();

    assert_eq!(report.scenarios[0].status, ScenarioStatus::Passed);
    assert_eq!(journal.entries()[0], "Scenario1_Seeded|/tmp/perf-results");
}

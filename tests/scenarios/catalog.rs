//! Test: Catalog - scenarios defined in YAML, run end to end

use crate::helpers::*;
use perf_runner::core::config::CatalogConfig;
use perf_runner::core::Platform;
use perf_runner::execution::{RunOutcome, ScenarioStatus};
use std::path::Path;

fn catalog_yaml(root: &Path, results: &Path) -> String {
    format!(
        r#"
name: "Shell scenarios"
scenarios:
  - name: "Scenario1_Shell"
    steps:
      - kind: generate
        classes: 2
        methods_per_class: 2
        root: "{root}"
      - kind: command
        name: "build-app"
        program: sh
        args: ["-c", "printf '#!/bin/sh\necho hello from {{{{ scenario }}}}\n' > app && chmod +x app"]
        produces: "app*"
      - kind: profile
        archive: "{{{{ scenario }}}}.zip"
        include_scenario: true
      - kind: move_files
        pattern: "*.zip"
        destination: "{results}"
      - kind: cleanup
  - name: "Scenario1_Broken"
    steps:
      - kind: generate
        classes: 1
        methods_per_class: 1
        root: "{root}"
      - kind: command
        program: sh
        args: ["-c", "exit 3"]
      - kind: cleanup
  - name: "Scenario1_WindowsOnly"
    platforms: [windows]
    steps:
      - kind: cleanup
"#,
        root = root.display(),
        results = results.display()
    )
}

#[cfg(unix)]
#[tokio::test]
async fn test_catalog_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let projects = dir.path().join("projects");
    let results = dir.path().join("results");

    let catalog = CatalogConfig::from_yaml(&catalog_yaml(&projects, &results)).unwrap();
    let mut runner = runner_on(Platform::Linux);
    catalog.register(&mut runner).unwrap();

    let report = runner.run("Scenario1_*").await.unwrap();

    assert_eq!(
        statuses(&report),
        vec![
            ("Scenario1_Shell".to_string(), ScenarioStatus::Passed),
            ("Scenario1_Broken".to_string(), ScenarioStatus::Failed),
            ("Scenario1_WindowsOnly".to_string(), ScenarioStatus::Skipped),
        ]
    );
    assert_eq!(report.outcome(), RunOutcome::SomeFailed { failed: 1 });

    let shell = report.scenario("Scenario1_Shell").unwrap();
    let steps: Vec<&str> = shell.steps.iter().map(|r| r.step.as_str()).collect();
    assert_eq!(steps, vec!["generate", "build-app", "profile", "move-files", "cleanup"]);

    // The archive made it to the results directory with its contents
    let archive_path = results.join("Scenario1_Shell.zip");
    assert!(archive_path.exists(), "{} missing", archive_path.display());
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
    let mut output = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("output.txt").unwrap(), &mut output).unwrap();
    assert!(output.contains("hello from Scenario1_Shell"));
    assert!(archive.by_name("timing.json").is_ok());
    assert!(archive.by_name("scenario/Cargo.toml").is_ok());

    // The broken scenario stopped at its command and never cleaned up
    let broken = report.scenario("Scenario1_Broken").unwrap();
    assert_eq!(broken.steps.len(), 2);
    assert!(broken.message.as_deref().unwrap().starts_with("sh: "));

    // Only the broken scenario's project is left behind
    let leftovers: Vec<_> = std::fs::read_dir(&projects).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_builtin_catalog_registers() {
    let catalog = CatalogConfig::builtin().unwrap();
    let mut runner = runner_on(Platform::Linux);
    catalog.register(&mut runner).unwrap();

    let listing = runner.scenarios();
    assert!(listing.contains(&("Default", "Scenario1_PlainProcess", true)));
    assert!(listing.contains(&("Default", "Scenario1_PerfRecord", true)));

    let mut windows = runner_on(Platform::Windows);
    catalog.register(&mut windows).unwrap();
    assert!(windows
        .scenarios()
        .contains(&("Default", "Scenario1_PerfRecord", false)));
}

#[test]
fn test_catalog_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    std::fs::write(
        &path,
        "scenarios:\n  - name: Only\n    steps:\n      - kind: cleanup\n",
    )
    .unwrap();

    let catalog = CatalogConfig::from_file(&path).unwrap();
    assert_eq!(catalog.scenarios.len(), 1);

    let missing = CatalogConfig::from_file(dir.path().join("missing.yaml"));
    assert!(missing.is_err());
}

//! Pipelines runner - selects scenarios, runs them one by one, aggregates results

use crate::core::{
    bag::{keys, ParameterBag},
    pipeline::{Pipeline, PipelineEvent},
    platform::Platform,
    state::StepRecord,
};
use crate::execution::{
    filter::{FilterError, NameFilter},
    registry::{RegistryError, ScenarioRegistry},
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Exit code when every selected scenario passed
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when at least one selected scenario failed
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the filter selected nothing runnable on this host
pub const EXIT_NO_MATCH: i32 = 2;

/// Events emitted while the runner works through the registry
#[derive(Debug, Clone)]
pub enum RunEvent {
    ScenarioStarted {
        group: String,
        scenario: String,
        total_steps: usize,
    },
    Step {
        scenario: String,
        event: PipelineEvent,
    },
    ScenarioFinished {
        group: String,
        scenario: String,
        status: ScenarioStatus,
        message: Option<String>,
    },
    ScenarioSkipped {
        group: String,
        scenario: String,
        host: Platform,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Final state of one scenario in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Host platform not supported; not counted as a failure
    Skipped,
}

/// Per-scenario entry of a [`RunReport`]
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub group: String,
    pub scenario: String,
    pub status: ScenarioStatus,
    pub run_id: Option<Uuid>,
    /// Message of the failing step, if any
    pub message: Option<String>,
    pub steps: Vec<StepRecord>,
    pub elapsed_ms: u64,
}

/// Aggregate verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RunOutcome {
    NoScenariosMatched,
    AllPassed,
    SomeFailed { failed: usize },
}

/// Everything a call to [`PipelinesRunner::run`] produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub host: Platform,
    pub filter: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    pub fn skipped_platform(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    /// Scenarios that actually ran
    pub fn executed(&self) -> usize {
        self.passed() + self.failed()
    }

    pub fn outcome(&self) -> RunOutcome {
        match (self.executed(), self.failed()) {
            (0, _) => RunOutcome::NoScenariosMatched,
            (_, 0) => RunOutcome::AllPassed,
            (_, failed) => RunOutcome::SomeFailed { failed },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome() {
            RunOutcome::AllPassed => EXIT_SUCCESS,
            RunOutcome::SomeFailed { .. } => EXIT_FAILURE,
            RunOutcome::NoScenariosMatched => EXIT_NO_MATCH,
        }
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.scenario == name)
    }
}

/// Owns the scenario registry and runs its pipelines
pub struct PipelinesRunner {
    registry: ScenarioRegistry,
    host: Platform,
    results_dir: PathBuf,
    event_handlers: Vec<EventHandler>,
}

impl PipelinesRunner {
    pub fn new() -> Self {
        Self {
            registry: ScenarioRegistry::new(),
            host: Platform::current(),
            results_dir: PathBuf::from("Results"),
            event_handlers: Vec::new(),
        }
    }

    /// Pretend to run on another platform
    pub fn with_platform(mut self, host: Platform) -> Self {
        self.host = host;
        self
    }

    /// Directory seeded into every bag as [`keys::RESULTS_DIR`]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit(&self, event: RunEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Register a scenario
    pub fn add_pipeline<F>(
        &mut self,
        group: &str,
        scenario: &str,
        platforms: &[Platform],
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ParameterBag) -> Pipeline + Send + Sync + 'static,
    {
        self.registry.add(group, scenario, platforms, factory)
    }

    /// Scenarios with whether each one can run on the host
    pub fn scenarios(&self) -> Vec<(&str, &str, bool)> {
        self.registry
            .iter()
            .map(|d| (d.group.as_str(), d.scenario.as_str(), d.supports(self.host)))
            .collect()
    }

    fn fresh_bag(&self, scenario: &str) -> ParameterBag {
        let mut bag = ParameterBag::new();
        bag.set(keys::SCENARIO, scenario);
        bag.set(keys::RESULTS_DIR, self.results_dir.clone());
        bag
    }

    /// Run every scenario whose name matches `name_filter` and whose
    /// platforms include the host, in registration order.
    ///
    /// A failing scenario never stops the ones after it. A filter that
    /// cannot be compiled is an error and runs nothing.
    pub async fn run(&self, name_filter: &str) -> Result<RunReport, FilterError> {
        let filter = NameFilter::new(name_filter)?;
        let mut scenarios = Vec::new();

        info!(
            "Running scenarios matching '{}' on {}",
            filter.pattern(),
            self.host
        );

        for definition in self.registry.iter() {
            if !filter.matches(&definition.scenario) {
                continue;
            }

            if !definition.supports(self.host) {
                info!(
                    "Skipping {} (not supported on {})",
                    definition.scenario, self.host
                );
                self.emit(RunEvent::ScenarioSkipped {
                    group: definition.group.clone(),
                    scenario: definition.scenario.clone(),
                    host: self.host,
                });
                scenarios.push(ScenarioReport {
                    group: definition.group.clone(),
                    scenario: definition.scenario.clone(),
                    status: ScenarioStatus::Skipped,
                    run_id: None,
                    message: None,
                    steps: Vec::new(),
                    elapsed_ms: 0,
                });
                continue;
            }

            let pipeline = definition.build(self.fresh_bag(&definition.scenario));
            self.emit(RunEvent::ScenarioStarted {
                group: definition.group.clone(),
                scenario: definition.scenario.clone(),
                total_steps: pipeline.len(),
            });

            let clock = Instant::now();
            let scenario_name = definition.scenario.clone();
            let result = pipeline
                .run_with_events(&|event| {
                    self.emit(RunEvent::Step {
                        scenario: scenario_name.clone(),
                        event,
                    })
                })
                .await;
            let elapsed_ms = clock.elapsed().as_millis() as u64;

            let (status, message) = if result.is_success() {
                info!("Scenario {} passed in {} ms", definition.scenario, elapsed_ms);
                (ScenarioStatus::Passed, None)
            } else {
                let message = result
                    .failure()
                    .map(|r| format!("{}: {}", r.step, r.outcome.message));
                error!(
                    "Scenario {} failed: {}",
                    definition.scenario,
                    message.as_deref().unwrap_or("unknown failure")
                );
                (ScenarioStatus::Failed, message)
            };

            self.emit(RunEvent::ScenarioFinished {
                group: definition.group.clone(),
                scenario: definition.scenario.clone(),
                status,
                message: message.clone(),
            });
            scenarios.push(ScenarioReport {
                group: definition.group.clone(),
                scenario: definition.scenario.clone(),
                status,
                run_id: Some(result.run_id),
                message,
                steps: result.records,
                elapsed_ms,
            });
        }

        let report = RunReport {
            host: self.host,
            filter: filter.pattern().to_string(),
            scenarios,
        };

        if report.executed() == 0 {
            warn!("No scenarios matched '{}' on {}", report.filter, self.host);
        }

        Ok(report)
    }
}

impl Default for PipelinesRunner {
    fn default() -> Self {
        Self::new()
    }
}

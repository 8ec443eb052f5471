//! Test utility functions for perf-runner

#![allow(dead_code)]

use async_trait::async_trait;
use perf_runner::core::{
    factory, ParameterBag, Pipeline, Platform, Step, StepError, StepFactory, StepOutcome,
};
use perf_runner::execution::{PipelinesRunner, RunReport, ScenarioStatus};
use std::sync::{Arc, Mutex};

/// Shared, ordered record of what the steps under test did
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of entries starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

/// Step driven by a small script: optionally read a key, optionally write
/// one, then succeed or fail
pub struct ScriptedStep {
    name: String,
    journal: Journal,
    succeed: bool,
    reads: Option<String>,
    writes: Option<(String, String)>,
}

#[async_trait]
impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        self.journal.record(format!("run:{}", self.name));

        if let Some(key) = &self.reads {
            let value = bag.get_text(key)?;
            self.journal.record(format!("saw:{}:{}", self.name, value));
        }
        if let Some((key, value)) = &self.writes {
            bag.set(key.clone(), value.as_str());
        }

        if self.succeed {
            Ok(StepOutcome::success(format!("{} ok", self.name)))
        } else {
            Ok(StepOutcome::failure(format!("{} failed", self.name)))
        }
    }
}

fn scripted(
    name: &str,
    journal: &Journal,
    succeed: bool,
    reads: Option<&str>,
    writes: Option<(&str, &str)>,
) -> StepFactory {
    let step = ScriptedStep {
        name: name.to_string(),
        journal: journal.clone(),
        succeed,
        reads: reads.map(str::to_string),
        writes: writes.map(|(k, v)| (k.to_string(), v.to_string())),
    };
    let journal = journal.clone();
    factory(move |_| {
        journal.record(format!("build:{}", step.name));
        step
    })
}

pub fn passing(name: &str, journal: &Journal) -> StepFactory {
    scripted(name, journal, true, None, None)
}

pub fn failing(name: &str, journal: &Journal) -> StepFactory {
    scripted(name, journal, false, None, None)
}

pub fn writing(name: &str, key: &str, value: &str, journal: &Journal) -> StepFactory {
    scripted(name, journal, true, None, Some((key, value)))
}

pub fn reading(name: &str, key: &str, journal: &Journal) -> StepFactory {
    scripted(name, journal, true, Some(key), None)
}

/// Chain factories into a pipeline around `bag`
pub fn chain(bag: ParameterBag, steps: Vec<StepFactory>) -> Pipeline {
    let mut steps = steps.into_iter();
    let first = steps.next().expect("at least one step");
    steps.fold(Pipeline::first_step(first, bag), |p, s| p.next_step(s))
}

/// Pipeline factory for the runner: `(step name, succeeds)` per step,
/// each name prefixed with the scenario name in the journal
pub fn scenario_of(
    journal: &Journal,
    steps: &[(&str, bool)],
) -> impl Fn(ParameterBag) -> Pipeline + Send + Sync + 'static {
    let journal = journal.clone();
    let steps: Vec<(String, bool)> = steps.iter().map(|(n, ok)| (n.to_string(), *ok)).collect();
    move |bag| {
        let scenario = bag.scenario().unwrap_or("?").to_string();
        let factories = steps
            .iter()
            .map(|(name, ok)| scripted(&format!("{}/{}", scenario, name), &journal, *ok, None, None))
            .collect();
        chain(bag, factories)
    }
}

pub fn runner_on(platform: Platform) -> PipelinesRunner {
    PipelinesRunner::new().with_platform(platform)
}

/// `(scenario, status)` pairs in report order
pub fn statuses(report: &RunReport) -> Vec<(String, ScenarioStatus)> {
    report
        .scenarios
        .iter()
        .map(|s| (s.scenario.clone(), s.status))
        .collect()
}

//! Scenario registry - named, platform-gated pipeline definitions

use crate::core::{bag::ParameterBag, pipeline::Pipeline, platform::Platform};
use thiserror::Error;

/// Registration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Scenario '{scenario}' is already registered in group '{group}'")]
    DuplicateScenario { group: String, scenario: String },

    #[error("Scenario '{0}' declares no supported platform")]
    NoPlatforms(String),
}

/// Builds a pipeline around a fresh bag
pub type PipelineFactory = Box<dyn Fn(ParameterBag) -> Pipeline + Send + Sync>;

/// A scenario: a pipeline template bound to a group, a name and the
/// platforms it may run on
pub struct PipelineDefinition {
    pub group: String,
    pub scenario: String,
    pub platforms: Vec<Platform>,
    factory: PipelineFactory,
}

impl PipelineDefinition {
    /// Unrecognized hosts are never supported
    pub fn supports(&self, platform: Platform) -> bool {
        platform != Platform::Other && self.platforms.contains(&platform)
    }

    /// Instantiate the pipeline for one run
    pub fn build(&self, bag: ParameterBag) -> Pipeline {
        (self.factory)(bag)
    }
}

impl std::fmt::Debug for PipelineDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDefinition")
            .field("group", &self.group)
            .field("scenario", &self.scenario)
            .field("platforms", &self.platforms)
            .finish_non_exhaustive()
    }
}

/// Definitions in registration order, unique per group and scenario name
#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    definitions: Vec<PipelineDefinition>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A duplicate leaves the registry untouched.
    pub fn add<F>(
        &mut self,
        group: &str,
        scenario: &str,
        platforms: &[Platform],
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ParameterBag) -> Pipeline + Send + Sync + 'static,
    {
        if self.get(group, scenario).is_some() {
            return Err(RegistryError::DuplicateScenario {
                group: group.to_string(),
                scenario: scenario.to_string(),
            });
        }
        if platforms.is_empty() {
            return Err(RegistryError::NoPlatforms(scenario.to_string()));
        }

        self.definitions.push(PipelineDefinition {
            group: group.to_string(),
            scenario: scenario.to_string(),
            platforms: platforms.to_vec(),
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn get(&self, group: &str, scenario: &str) -> Option<&PipelineDefinition> {
        self.definitions
            .iter()
            .find(|d| d.group == group && d.scenario == scenario)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

//! Scenario selection and execution

pub mod filter;
pub mod registry;
pub mod runner;

pub use filter::{FilterError, NameFilter};
pub use registry::{PipelineDefinition, PipelineFactory, RegistryError, ScenarioRegistry};
pub use runner::{
    EventHandler, PipelinesRunner, RunEvent, RunOutcome, RunReport, ScenarioReport,
    ScenarioStatus,
};

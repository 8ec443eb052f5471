//! perf-runner - performance scenario pipelines: generate, build, profile, collect, clean up

pub mod cli;
pub mod core;
pub mod execution;
pub mod steps;

// Re-export commonly used types
pub use core::{
    BagError, BagValue, CatalogConfig, ParameterBag, Pipeline, Platform, Step, StepError,
    StepOutcome,
};
pub use execution::{PipelinesRunner, RegistryError, RunOutcome, RunReport};

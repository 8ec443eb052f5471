//! Step abstraction

use crate::core::{bag::{BagError, ParameterBag}, state::StepOutcome};
use crate::steps::ProcessError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a step can raise instead of returning an outcome.
///
/// The pipeline records any of these as a failed outcome for the step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Bag(#[from] BagError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("{0}")]
    Invalid(String),
}

impl From<zip::result::ZipError> for StepError {
    fn from(err: zip::result::ZipError) -> Self {
        StepError::Archive(err.to_string())
    }
}

/// One stage of a pipeline
#[async_trait]
pub trait Step: Send {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Run the step against the shared bag
    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError>;
}

/// Deferred step constructor, invoked with the bag right before the step runs
pub type StepFactory = Box<dyn FnOnce(&ParameterBag) -> Box<dyn Step> + Send>;

/// Wrap a closure as a step factory
pub fn factory<S, F>(f: F) -> StepFactory
where
    S: Step + 'static,
    F: FnOnce(&ParameterBag) -> S + Send + 'static,
{
    Box::new(move |bag| Box::new(f(bag)) as Box<dyn Step>)
}

/// A step backed by a synchronous closure
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F>
where
    F: FnMut(&mut ParameterBag) -> Result<StepOutcome, StepError> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: FnMut(&mut ParameterBag) -> Result<StepOutcome, StepError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        (self.f)(bag)
    }
}

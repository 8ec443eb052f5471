//! Pipeline - a linear, fail-fast chain of steps sharing one parameter bag

use crate::core::{
    bag::ParameterBag,
    state::{PipelineResult, PipelineStatus, StepOutcome, StepRecord},
    step::StepFactory,
};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted while a pipeline runs
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StepStarted {
        run_id: Uuid,
        index: usize,
        step: String,
    },
    StepFinished {
        run_id: Uuid,
        record: StepRecord,
    },
}

/// An ordered chain of step factories plus the bag they share.
///
/// Factories are invoked lazily, right before their step's turn, so a step
/// constructor can read whatever earlier steps wrote into the bag.
pub struct Pipeline {
    factories: Vec<StepFactory>,
    bag: ParameterBag,
}

impl Pipeline {
    /// Start a chain with its first step
    pub fn first_step(factory: StepFactory, bag: ParameterBag) -> Self {
        Self {
            factories: vec![factory],
            bag,
        }
    }

    /// Append a step to the chain
    pub fn next_step(mut self, factory: StepFactory) -> Self {
        self.factories.push(factory);
        self
    }

    /// Number of registered steps
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn bag(&self) -> &ParameterBag {
        &self.bag
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(self) -> PipelineResult {
        self.run_with_events(&|_| {}).await
    }

    /// Run the chain, reporting progress through `emit`
    pub async fn run_with_events(self, emit: &(dyn Fn(PipelineEvent) + Sync)) -> PipelineResult {
        let Pipeline { factories, mut bag } = self;
        let run_id = Uuid::new_v4();
        let total = factories.len();
        let mut records = Vec::with_capacity(total);
        let mut status = PipelineStatus::Succeeded;

        debug!("Starting pipeline run {} with {} steps", run_id, total);

        for (index, factory) in factories.into_iter().enumerate() {
            let mut step = factory(&bag);
            let name = step.name().to_string();

            info!("[{}/{}] {}", index + 1, total, name);
            emit(PipelineEvent::StepStarted {
                run_id,
                index,
                step: name.clone(),
            });

            let started_at = Utc::now();
            let clock = Instant::now();
            let outcome = match step.execute(&mut bag).await {
                Ok(outcome) => outcome,
                Err(e) => StepOutcome::failure(e.to_string()),
            };
            let elapsed = clock.elapsed();

            let record = StepRecord {
                step: name,
                index,
                outcome,
                started_at,
                elapsed,
            };
            let succeeded = record.succeeded();

            if succeeded {
                debug!("Step {} succeeded in {:?}", record.step, elapsed);
            } else {
                warn!("Step {} failed: {}", record.step, record.outcome.message);
            }

            emit(PipelineEvent::StepFinished {
                run_id,
                record: record.clone(),
            });
            records.push(record);

            if !succeeded {
                status = PipelineStatus::Failed;
                break;
            }
        }

        PipelineResult {
            run_id,
            status,
            records,
            bag,
        }
    }
}

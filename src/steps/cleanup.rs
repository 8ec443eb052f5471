//! Removes temporary resources registered by earlier steps

use crate::core::{
    bag::{keys, ParameterBag},
    state::StepOutcome,
    step::{Step, StepError},
};
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::fs;
use tracing::debug;

/// Deletes every path listed under [`keys::DISPOSABLES`].
///
/// Targets that are already gone are not an error.
#[derive(Debug, Clone, Default)]
pub struct CleanupDisposable;

impl CleanupDisposable {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for CleanupDisposable {
    fn name(&self) -> &str {
        "cleanup"
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        if bag.try_get(keys::DISPOSABLES).is_none() {
            return Ok(StepOutcome::success("Nothing to clean up"));
        }

        let mut removed = 0;
        for path in bag.get_paths(keys::DISPOSABLES)? {
            let result = if path.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            match result {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Already removed: {}", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(StepOutcome::success(format!("Removed {} path(s)", removed)))
    }
}

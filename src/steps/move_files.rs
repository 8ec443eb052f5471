//! Relocates produced files into the results directory

use crate::core::{
    bag::{keys, ParameterBag},
    state::StepOutcome,
    step::{Step, StepError},
};
use crate::steps::artifact;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Moves every file matching `pattern` (relative to the working directory)
/// into `destination`, or into [`keys::RESULTS_DIR`] when no destination is
/// given. Paths below the working directory are kept; existing files at the
/// destination are overwritten with a warning.
#[derive(Debug, Clone)]
pub struct MoveFiles {
    pattern: String,
    destination: Option<PathBuf>,
}

impl MoveFiles {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            destination: None,
        }
    }

    pub fn to(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Rename, falling back to copy + delete when crossing filesystems
async fn relocate(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    fs::copy(from, to).await?;
    fs::remove_file(from).await
}

#[async_trait]
impl Step for MoveFiles {
    fn name(&self) -> &str {
        "move-files"
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        let source_dir = match bag.try_get(keys::WORKING_DIR) {
            Some(_) => bag.working_dir()?.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let destination = match &self.destination {
            Some(dir) => dir.clone(),
            None => bag.results_dir()?.to_path_buf(),
        };

        let matches = artifact::expand(&source_dir, &self.pattern)?;
        if matches.is_empty() {
            warn!("No files match '{}' in {}", self.pattern, source_dir.display());
            return Ok(StepOutcome::success(format!(
                "No files matched '{}'",
                self.pattern
            )));
        }

        fs::create_dir_all(&destination).await?;

        let mut moved = Vec::with_capacity(matches.len());
        for file in matches {
            let Some(file_name) = file.file_name() else {
                continue;
            };
            // Keep the layout below the source dir so equal names don't collide
            let relative = file
                .strip_prefix(&source_dir)
                .unwrap_or_else(|_| Path::new(file_name));
            let target = destination.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            if moved.contains(&target) || fs::metadata(&target).await.is_ok() {
                warn!("Overwriting {}", target.display());
            }
            debug!("Moving {} -> {}", file.display(), target.display());
            relocate(&file, &target).await?;
            moved.push(target);
        }

        Ok(StepOutcome::success(format!(
            "Moved {} file(s) into {}",
            moved.len(),
            destination.display()
        ))
        .with_artifacts(moved))
    }
}

//! Execution outcome models

use crate::core::bag::ParameterBag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Result reported by a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    pub message: String,
    pub artifacts: Vec<PathBuf>,
}

impl StepOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }

    pub fn with_artifacts(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.artifacts.extend(paths);
        self
    }
}

/// A step outcome as recorded by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Name reported by the step
    pub step: String,

    /// Position in the chain (0-based)
    pub index: usize,

    pub outcome: StepOutcome,

    pub started_at: DateTime<Utc>,

    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl StepRecord {
    pub fn succeeded(&self) -> bool {
        self.outcome.success
    }
}

/// Overall pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Succeeded,
    Failed,
}

/// Terminal result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub status: PipelineStatus,

    /// Outcomes of every step that was instantiated, in chain order
    pub records: Vec<StepRecord>,

    /// The bag as left by the last executed step
    pub bag: ParameterBag,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Succeeded
    }

    /// The failing step's record, if any
    pub fn failure(&self) -> Option<&StepRecord> {
        self.records.iter().find(|r| !r.succeeded())
    }

    /// Artifacts reported by every executed step
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.records
            .iter()
            .flat_map(|r| r.outcome.artifacts.iter().cloned())
            .collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.records.iter().map(|r| r.elapsed).sum()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

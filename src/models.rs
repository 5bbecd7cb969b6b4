use serde::{Serialize, Deserialize};

/// A file produced during a run and registered in the manifest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectedFile {
    /// Path relative to the run directory
    pub path: String,
    /// Size in bytes, `None` when it could not be determined
    pub size: Option<u64>,
    pub description: String,
    pub written_at: String,
}

/// A task that did not produce its output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub task: String,
    pub reason: String,
}

/// Outcome of a single collection task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Collected { path: String },
    Failed { reason: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Collected { .. })
    }
}

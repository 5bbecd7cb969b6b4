//! The run accumulator.
//!
//! A [`Run`] is created once per invocation and threaded by `&mut` through
//! every collection task. It owns the output directory, the manifest and the
//! ordered record of task outcomes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{info, warn};

use crate::constants::{MANIFEST_TASK, OUTPUT_FILE_PREFIX, TIMESTAMP_FORMAT};
use crate::models::{CollectedFile, FailureRecord, TaskOutcome};
use crate::utils::manifest::Manifest;

/// Current local time in the manifest/summary format.
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Name of the file a task writes: `logs_<identifier>_<stem>.<extension>`.
pub fn output_file_name(identifier: &str, stem: &str, extension: &str) -> String {
    format!("{}_{}_{}.{}", OUTPUT_FILE_PREFIX, identifier, stem, extension)
}

/// State of a single collection run.
#[derive(Debug)]
pub struct Run {
    identifier: String,
    started_at: DateTime<Local>,
    output_dir: PathBuf,
    outcomes: Vec<(String, TaskOutcome)>,
    failures: Vec<FailureRecord>,
    manifest: Manifest,
}

impl Run {
    /// Create `<output_root>/<identifier>` and start its manifest.
    ///
    /// Any failure here is fatal for the run.
    pub fn create(identifier: &str, output_root: &Path) -> Result<Self> {
        let started_at = Local::now();
        let output_dir = output_root.join(identifier);

        fs::create_dir_all(&output_dir)
            .context(format!("Failed to create output directory {}", output_dir.display()))?;

        info!("Output directory created at {}", output_dir.display());

        let manifest_name = output_file_name(identifier, MANIFEST_TASK, "txt");
        let manifest = Manifest::create(
            &output_dir.join(&manifest_name),
            &manifest_name,
            identifier,
            &format_timestamp(&started_at),
        )?;

        Ok(Self {
            identifier: identifier.to_string(),
            started_at,
            output_dir,
            outcomes: Vec::new(),
            failures: Vec::new(),
            manifest,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn started_at(&self) -> &DateTime<Local> {
        &self.started_at
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve a file name inside the run directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Register a file already written into the run directory.
    pub fn record_file(&mut self, task: &str, file_name: &str, description: &str) -> CollectedFile {
        let size = fs::metadata(self.output_path(file_name)).ok().map(|m| m.len());
        let entry = CollectedFile {
            path: file_name.to_string(),
            size,
            description: description.to_string(),
            written_at: timestamp_now(),
        };

        if let Err(e) = self.manifest.append(entry.clone()) {
            warn!("Failed to record {} in manifest: {:#}", file_name, e);
        }
        self.outcomes.push((
            task.to_string(),
            TaskOutcome::Collected { path: file_name.to_string() },
        ));

        entry
    }

    pub fn record_failure(&mut self, task: &str, reason: &str) {
        warn!("Collection '{}' failed: {}", task, reason);
        self.failures.push(FailureRecord {
            task: task.to_string(),
            reason: reason.to_string(),
        });
        self.outcomes.push((
            task.to_string(),
            TaskOutcome::Failed { reason: reason.to_string() },
        ));
    }

    /// Append the manifest's self-entry. Nothing may be recorded afterwards.
    pub fn finalize_manifest(&mut self) -> Result<CollectedFile> {
        let entry = self.manifest.append_self(&timestamp_now())?;
        self.outcomes.push((
            MANIFEST_TASK.to_string(),
            TaskOutcome::Collected { path: entry.path.clone() },
        ));
        Ok(entry)
    }

    pub fn collected(&self) -> &[CollectedFile] {
        self.manifest.entries()
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn outcomes(&self) -> &[(String, TaskOutcome)] {
        &self.outcomes
    }

    pub fn manifest_path(&self) -> &Path {
        self.manifest.path()
    }
}

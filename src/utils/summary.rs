use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::{CollectedFile, FailureRecord};
use crate::run::Run;
use crate::utils::hash::calculate_sha256;

/// Files above this size are listed in the report without a digest
const REPORT_HASH_LIMIT_MB: u64 = 1024;

/// Read-only view over a finished run.
#[derive(Debug)]
pub struct Summary<'a> {
    pub identifier: &'a str,
    pub hostname: &'a str,
    pub started_at: String,
    pub finished_at: String,
    pub output_dir: &'a Path,
    pub collected: &'a [CollectedFile],
    pub failures: &'a [FailureRecord],
}

impl<'a> Summary<'a> {
    pub fn from_run(run: &'a Run, hostname: &'a str, finished_at: String) -> Self {
        Self {
            identifier: run.identifier(),
            hostname,
            started_at: crate::run::format_timestamp(run.started_at()),
            finished_at,
            output_dir: run.output_dir(),
            collected: run.collected(),
            failures: run.failures(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable rendering, written to the summary file and the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "==================== Diagnostic collection summary ====================");
        let _ = writeln!(out, "Run identifier : {}", self.identifier);
        let _ = writeln!(out, "Host           : {}", self.hostname);
        let _ = writeln!(out, "Started        : {}", self.started_at);
        let _ = writeln!(out, "Finished       : {}", self.finished_at);
        let _ = writeln!(out, "Output dir     : {}", self.output_dir.display());
        let _ = writeln!(out);

        let _ = writeln!(out, "Collected files ({}):", self.collected.len());
        for file in self.collected {
            let size = file
                .size
                .map(|s| format!("{} bytes", s))
                .unwrap_or_else(|| "size unknown".to_string());
            let _ = writeln!(out, "  - {} ({}) - {}", file.path, size, file.description);
        }
        let _ = writeln!(out);

        if self.all_succeeded() {
            let _ = writeln!(out, "All collections succeeded.");
        } else {
            let _ = writeln!(out, "Failed collections ({}):", self.failures.len());
            for failure in self.failures {
                let _ = writeln!(out, "  - {}: {}", failure.task, failure.reason);
            }
        }

        out
    }
}

/// Create the JSON report of a run.
///
/// Lists every file recorded so far with its SHA-256 digest and every
/// failure. Each call gets a fresh collection ID.
pub fn create_run_report(run: &Run, hostname: &str, generated_at: &str) -> Result<String> {
    let files: Vec<_> = run
        .collected()
        .iter()
        .map(|file| {
            let sha256 = calculate_sha256(&run.output_path(&file.path), REPORT_HASH_LIMIT_MB)
                .ok()
                .flatten();
            json!({
                "path": file.path,
                "size": file.size,
                "description": file.description,
                "written_at": file.written_at,
                "sha256": sha256,
            })
        })
        .collect();

    let report = json!({
        "collection_id": Uuid::new_v4().to_string(),
        "identifier": run.identifier(),
        "hostname": hostname,
        "collector_version": env!("CARGO_PKG_VERSION"),
        "started_at": crate::run::format_timestamp(run.started_at()),
        "generated_at": generated_at,
        "output_dir": run.output_dir().display().to_string(),
        "files": files,
        "failures": run.failures(),
        "outcomes": run
            .outcomes()
            .iter()
            .map(|(task, outcome)| json!({ "task": task, "outcome": outcome }))
            .collect::<Vec<_>>(),
    });

    serde_json::to_string_pretty(&report).context("Failed to serialize run report to JSON")
}

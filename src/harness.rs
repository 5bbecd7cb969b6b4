//! End-to-end flow of one collection run.
//!
//! ```text
//! create run dir ─> preflight ─> tasks ─> report ─> manifest self-entry
//!                                                    └─> summary ─> archive
//! ```
//!
//! Only creating the run directory and its manifest can fail the run.
//! Everything after that is recorded and reported.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::collectors::host::HostEnvironment;
use crate::collectors::preflight::{self, PackageManager, PreflightStatus};
use crate::collectors::registry::default_registry;
use crate::collectors::runner;
use crate::config::CollectorConfig;
use crate::constants::{REPORT_TASK, SUMMARY_TASK};
use crate::models::{CollectedFile, FailureRecord};
use crate::run::{output_file_name, timestamp_now, Run};
use crate::utils::compress::archive_output;
use crate::utils::summary::{create_run_report, Summary};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunResult {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub summary_text: String,
    /// Archive path and size, when archival was enabled and succeeded
    pub archive: Option<(PathBuf, u64)>,
    pub collected: Vec<CollectedFile>,
    pub failures: Vec<FailureRecord>,
    pub preflight: Vec<(String, PreflightStatus)>,
}

impl RunResult {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Host name for the summary and report, `unknown` if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Run a complete collection for `identifier` on `host`.
///
/// The package manager is detected from `host` when `config.auto_install`
/// is set.
pub fn execute(identifier: &str, config: &CollectorConfig, host: &HostEnvironment) -> Result<RunResult> {
    let manager = if config.auto_install {
        Some(preflight::detect_package_manager(host))
    } else {
        None
    };
    execute_with(identifier, config, host, manager.as_deref())
}

/// Like [`execute`], with the package manager supplied by the caller.
/// `None` skips the preflight.
pub fn execute_with(
    identifier: &str,
    config: &CollectorConfig,
    host: &HostEnvironment,
    manager: Option<&dyn PackageManager>,
) -> Result<RunResult> {
    let mut run = Run::create(identifier, &config.output_root())
        .context("Failed to initialize the run directory")?;

    let preflight = match manager {
        Some(manager) => {
            let report = preflight::ensure_tools(host, manager, &preflight::optional_tools());
            for (label, status) in &report {
                if *status == PreflightStatus::Unavailable {
                    warn!("{} unavailable, dependent collections will fail", label);
                }
            }
            report
        }
        None => {
            info!("Skipping dependency preflight");
            Vec::new()
        }
    };

    let registry = default_registry(config, host);
    runner::run_all(&mut run, &registry, host);

    let hostname = local_hostname();
    write_report(&mut run, &hostname);

    let manifest_entry = run
        .finalize_manifest()
        .context("Failed to finalize the manifest")?;
    info!("Manifest written to {}", manifest_entry.path);

    let summary_text = Summary::from_run(&run, &hostname, timestamp_now()).render();
    let summary_name = output_file_name(identifier, SUMMARY_TASK, "txt");
    let summary_path = run.output_path(&summary_name);
    let summary_path = match fs::write(&summary_path, &summary_text) {
        Ok(()) => Some(summary_path),
        Err(e) => {
            warn!("Failed to write {}: {}", summary_name, e);
            None
        }
    };

    let archive = if config.archive {
        match archive_output(run.output_dir(), identifier) {
            Ok(archive) => Some(archive),
            Err(e) => {
                warn!("Archive creation failed: {:#}", e);
                None
            }
        }
    } else {
        info!("Archival disabled");
        None
    };

    Ok(RunResult {
        output_dir: run.output_dir().to_path_buf(),
        manifest_path: run.manifest_path().to_path_buf(),
        summary_path,
        summary_text,
        archive,
        collected: run.collected().to_vec(),
        failures: run.failures().to_vec(),
        preflight,
    })
}

/// Write the JSON run report and record it like any other collected file.
fn write_report(run: &mut Run, hostname: &str) {
    let name = output_file_name(run.identifier(), REPORT_TASK, "json");

    let written = create_run_report(run, hostname, &timestamp_now())
        .and_then(|json| fs::write(run.output_path(&name), json).context(format!("cannot write {}", name)));

    match written {
        Ok(()) => {
            run.record_file(REPORT_TASK, &name, "Machine-readable run report");
        }
        Err(e) => run.record_failure(REPORT_TASK, &format!("{:#}", e)),
    }
}

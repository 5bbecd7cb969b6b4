use std::fs;

use anyhow::{anyhow, Result};
use log::{debug, info, warn};

use crate::collectors::host::HostEnvironment;
use crate::collectors::registry::TaskRegistry;
use crate::collectors::task::Task;
use crate::models::TaskOutcome;
use crate::run::{output_file_name, Run};

/// Run a single task and record its outcome in `run`.
///
/// Every error is captured here and turned into a failure record, so one
/// task can never abort the collection loop.
pub fn run_task(run: &mut Run, task: &Task, host: &HostEnvironment) -> TaskOutcome {
    let file_name = output_file_name(run.identifier(), &task.file_stem, &task.extension);
    let path = run.output_path(&file_name);

    info!("Collecting {}", task.name);

    let result: Result<()> = (|| {
        task.check_capability(host)?;
        if task.write_output(host, &path)? == 0 {
            return Err(anyhow!("produced no output"));
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            let entry = run.record_file(&task.name, &file_name, &task.description);
            debug!("Wrote {} ({:?} bytes)", entry.path, entry.size);
            TaskOutcome::Collected { path: file_name }
        }
        Err(e) => {
            let mut reason = format!("{:#}", e);
            // Partial output of this run, or a file left by an earlier run
            // with the same identifier.
            if path.exists() {
                if let Err(remove_err) = fs::remove_file(&path) {
                    warn!("Failed to remove {}: {}", path.display(), remove_err);
                    reason = format!("{} ({} left in place: {})", reason, file_name, remove_err);
                }
            }
            run.record_failure(&task.name, &reason);
            TaskOutcome::Failed { reason }
        }
    }
}

/// Run every registered task in declared order.
pub fn run_all(run: &mut Run, registry: &TaskRegistry, host: &HostEnvironment) {
    info!("Running {} collection tasks", registry.len());

    for task in registry.tasks() {
        run_task(run, task, host);
    }

    info!(
        "Collection finished: {} files written, {} failures",
        run.collected().len(),
        run.failures().len()
    );
}

//! Collection task implementations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Preflight (optional tool install)     │
//! ├─────────────────────────────────────────┤
//! │   Registry: ordered task descriptors    │
//! ├─────────────────────────────────────────┤
//! │   Runner: one task at a time, errors    │
//! │   captured per task into the Run        │
//! ├─────────────────────────────────────────┤
//! │   Host: tool lookup and host paths      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use diag_collector::collectors::{host::HostEnvironment, registry, runner};
//! use diag_collector::config::CollectorConfig;
//! use diag_collector::run::Run;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let host = HostEnvironment::current();
//! let tasks = registry::default_registry(&CollectorConfig::default(), &host);
//! let mut run = Run::create("bench01", Path::new("/var/tmp"))?;
//!
//! runner::run_all(&mut run, &tasks, &host);
//! println!("{} files, {} failures", run.collected().len(), run.failures().len());
//! # Ok(())
//! # }
//! ```

/// Host environment and tool lookup
pub mod host;

/// Task descriptors and their sources
pub mod task;

/// The default task catalog
pub mod registry;

/// Sequential task execution with per-task error capture
pub mod runner;

/// Best-effort installation of optional tools
pub mod preflight;

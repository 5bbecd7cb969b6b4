//! # diag-collector
//!
//! A diagnostic log collector for Linux workstations and servers, aimed at
//! hardware and GPU troubleshooting.
//!
//! ## Overview
//!
//! One invocation produces one run directory named after a caller-supplied
//! identifier. Every collection task writes a single file into it; failures
//! are recorded and never stop the run. The directory ends with a manifest,
//! a JSON run report and a human-readable summary, and can optionally be
//! packed into `<identifier>_logs.tar.gz`.
//!
//! ## Features
//!
//! - **Kernel and boot state**: ring buffer, journal, cmdline, kernel config, device tree
//! - **Hardware inventory**: CPU, memory, block and USB devices, PCI topology, NUMA
//! - **GPU diagnostics**: NVIDIA, AMD ROCm, OpenCL, Vulkan and GLX probes
//! - **Dependency preflight**: best-effort install of `tree` and `fastfetch`/`neofetch`
//! - **Manifest**: every written file with timestamp, size and description
//! - **Archival**: tar.gz of the run directory
//!
//! ## Usage
//!
//! ```no_run
//! use diag_collector::collectors::host::HostEnvironment;
//! use diag_collector::config::load_config;
//! use diag_collector::harness;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = load_config()?;
//! let result = harness::execute("bench01", &config, &HostEnvironment::current())?;
//!
//! println!("{}", result.summary_text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Records of collected files and task outcomes
//! - [`run`]: The per-invocation run accumulator
//! - [`collectors`]: Task catalog, runner, host abstraction and preflight
//! - [`harness`]: End-to-end flow of one run
//! - [`config`]: YAML configuration and environment overrides
//! - [`utils`]: Manifest, summary, archive and hashing
//! - [`privileges`]: Root check
//! - [`constants`]: Application-wide constants
//!
//! ## Safety
//!
//! `unsafe` is limited to the `geteuid`/`getgroups` calls in
//! [`privileges`].

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// The run accumulator
pub mod run;

/// Collection tasks and the machinery that runs them
pub mod collectors;

/// Orchestration of a complete run
pub mod harness;

/// Utility functions for manifests, summaries, compression and hashing
pub mod utils;

/// Configuration management
pub mod config;

/// Platform-specific privilege checks
pub mod privileges;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;

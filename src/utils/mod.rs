//! Reporting and packaging utilities.
//!
//! ## Components
//!
//! - **Manifest**: append-only list of every file a run writes
//! - **Summary**: human-readable summary and JSON run report
//! - **Compression**: `<identifier>_logs.tar.gz` archive of a run directory
//! - **Hashing**: SHA-256 digests for the run report
//!
//! ### Archiving a run directory
//!
//! ```no_run
//! use diag_collector::utils::compress::archive_output;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let (archive, size) = archive_output(Path::new("/var/tmp/bench01"), "bench01")?;
//! println!("Created {} ({} bytes)", archive.display(), size);
//! # Ok(())
//! # }
//! ```

/// Append-only manifest of collected files
pub mod manifest;

/// Run summary and JSON report generation
pub mod summary;

/// tar.gz archive creation
pub mod compress;

/// Cryptographic hash calculation utilities
pub mod hash;

//! Global constants for the diag-collector application.
//!
//! File naming, environment variable names and the fixed text blocks written
//! into the manifest and summary live here so the layout of a run directory
//! is defined in one place.

// Output naming
/// Prefix shared by every file written into a run directory
pub const OUTPUT_FILE_PREFIX: &str = "logs";

/// Task name used for the manifest file itself
pub const MANIFEST_TASK: &str = "manifest";

/// Task name used for the human-readable summary
pub const SUMMARY_TASK: &str = "summary";

/// Task name used for the machine-readable run report
pub const REPORT_TASK: &str = "report";

/// Suffix of the archive written next to the run directory
pub const ARCHIVE_SUFFIX: &str = "_logs.tar.gz";

// Manifest format
/// Header block written at the top of every manifest
pub const MANIFEST_HEADER: &[&str] = &[
    "# Diagnostic log manifest",
    "# Entries are appended in collection order; the manifest's own entry is last.",
    "# Format: <timestamp> | <path> | <size> bytes | <description>",
];

/// Rendering of a size that could not be determined
pub const UNKNOWN_SIZE: &str = "unknown";

/// Timestamp format used in manifest lines and the summary
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Aggregated task output
/// Width of the `=` runs around aggregated section titles
pub const BANNER_RULE: &str = "=====";

// Environment variables
/// Path to a YAML configuration file
pub const ENV_CONFIG_PATH: &str = "DIAG_COLLECTOR_CONFIG";

/// Log level (error, warn, info, debug, trace)
pub const ENV_LOG_LEVEL: &str = "DIAG_COLLECTOR_LOG";

/// Overrides the directory in which run directories are created
pub const ENV_OUTPUT_ROOT: &str = "DIAG_COLLECTOR_OUTPUT_ROOT";

/// Disables archival when truthy
pub const ENV_NO_ARCHIVE: &str = "DIAG_COLLECTOR_NO_ARCHIVE";

/// Disables the package-manager preflight when truthy
pub const ENV_NO_INSTALL: &str = "DIAG_COLLECTOR_NO_INSTALL";

// Host paths
pub const PROC_PATH: &str = "/proc";
pub const SYS_PATH: &str = "/sys";
pub const BOOT_PATH: &str = "/boot";
pub const HOME_PATH: &str = "/home";
pub const ROOT_HOME_PATH: &str = "/root";

/// Kernel release as reported by `uname -r`
pub const KERNEL_RELEASE_PATH: &str = "/proc/sys/kernel/osrelease";

// Package management
/// Debian-family package installer
pub const APT_GET: &str = "apt-get";

/// Default subtrees dumped with `tree`
pub const DEFAULT_TREE_ROOTS: &[&str] = &["/boot", "/lib/firmware"];

/// Default shell history files looked up in each home directory
pub const DEFAULT_HISTORY_FILES: &[&str] = &[".bash_history", ".zsh_history"];

/// Buffer size for hashing collected files (1MB)
pub const HASH_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffer size for streaming files into the archive (1MB)
pub const ARCHIVE_BUFFER_SIZE: usize = 1024 * 1024;

/// Suffix of the uncompressed tar staged next to the archive while it is built
pub const ARCHIVE_STAGING_SUFFIX: &str = "_logs.tar.partial";

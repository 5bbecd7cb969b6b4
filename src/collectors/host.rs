//! Host environment and tool lookup.
//!
//! Every "is this tool installed" question in the collector goes through
//! [`HostEnvironment::locate`], the equivalent of `command -v`. Host paths
//! such as `/proc/meminfo` are resolved through [`HostEnvironment::host_path`]
//! so a run can be pointed at a fabricated filesystem tree.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

/// The slice of the host a run observes.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    /// Directories searched for tools, in order; also the `PATH` of children
    pub path_dirs: Vec<PathBuf>,
    /// Prefix applied to absolute host paths
    pub fs_root: PathBuf,
    /// Environment snapshot written by the `environment` task
    pub vars: Vec<(String, String)>,
}

impl HostEnvironment {
    /// Capture the environment of the current process.
    pub fn current() -> Self {
        let path_dirs = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();

        let mut vars: Vec<(String, String)> = env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().to_string(), v.to_string_lossy().to_string()))
            .collect();
        vars.sort();

        Self {
            path_dirs,
            fs_root: PathBuf::from("/"),
            vars,
        }
    }

    /// Find an executable named `tool` in the search path.
    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        self.path_dirs
            .iter()
            .map(|dir| dir.join(tool))
            .find(|candidate| is_executable(candidate))
    }

    pub fn is_available(&self, tool: &str) -> bool {
        let found = self.locate(tool).is_some();
        debug!("Tool '{}' available: {}", tool, found);
        found
    }

    /// Map an absolute host path onto `fs_root`.
    pub fn host_path(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.fs_root.join(relative)
    }

    /// Value handed to children as `PATH`.
    pub fn search_path(&self) -> OsString {
        env::join_paths(&self.path_dirs).unwrap_or_default()
    }

    /// Build a command for an already located executable.
    ///
    /// Stdin is closed so nothing a tool does can block on the terminal.
    pub fn command(&self, program: &Path) -> Command {
        let mut command = Command::new(program);
        command.env("PATH", self.search_path()).stdin(Stdio::null());
        command
    }
}

fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

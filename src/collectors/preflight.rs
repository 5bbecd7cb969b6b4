//! Best-effort installation of optional tools.
//!
//! Preflight never fails a run. A tool that is still missing afterwards only
//! disables the tasks that depend on it.

use std::cell::Cell;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};

use crate::collectors::host::HostEnvironment;
use crate::constants::APT_GET;

/// Something able to install packages on the host.
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager {
    fn name(&self) -> &'static str;
    fn install(&self, package: &str) -> Result<()>;
}

/// Debian-family installer driven through `apt-get`.
pub struct Apt {
    program: PathBuf,
    host: HostEnvironment,
    index_refreshed: Cell<bool>,
}

impl Apt {
    pub fn new(program: PathBuf, host: &HostEnvironment) -> Self {
        Self {
            program,
            host: host.clone(),
            index_refreshed: Cell::new(false),
        }
    }

    fn apt_get(&self, args: &[&str]) -> Result<()> {
        let status = self
            .host
            .command(&self.program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Failed to execute apt-get")?;

        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("apt-get {} exited with {}", args.join(" "), status))
        }
    }
}

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        APT_GET
    }

    fn install(&self, package: &str) -> Result<()> {
        if !self.index_refreshed.get() {
            self.index_refreshed.set(true);
            if let Err(e) = self.apt_get(&["update", "-qq"]) {
                debug!("Package index refresh failed: {:#}", e);
            }
        }
        self.apt_get(&["install", "-y", "-qq", package])
    }
}

/// Used when no supported package manager exists on the host.
pub struct Unsupported;

impl PackageManager for Unsupported {
    fn name(&self) -> &'static str {
        "none"
    }

    fn install(&self, package: &str) -> Result<()> {
        Err(anyhow!("no supported package manager to install {}", package))
    }
}

/// Pick the package manager available on `host`.
pub fn detect_package_manager(host: &HostEnvironment) -> Box<dyn PackageManager> {
    match host.locate(APT_GET) {
        Some(program) => {
            info!("Using {} for missing tools", APT_GET);
            Box::new(Apt::new(program, host))
        }
        None => {
            info!("No supported package manager found, missing tools will not be installed");
            Box::new(Unsupported)
        }
    }
}

/// A tool satisfied by any one of its alternatives, tried in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequirement {
    pub alternatives: Vec<String>,
}

impl ToolRequirement {
    pub fn any_of(alternatives: &[&str]) -> Self {
        Self {
            alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn label(&self) -> String {
        self.alternatives.join("/")
    }
}

/// Tools the task catalog can use but does not require.
pub fn optional_tools() -> Vec<ToolRequirement> {
    vec![
        ToolRequirement::any_of(&["tree"]),
        ToolRequirement::any_of(&["fastfetch", "neofetch"]),
    ]
}

/// What preflight did for one requirement.
#[derive(Debug, Clone, PartialEq)]
pub enum PreflightStatus {
    Present(String),
    Installed(String),
    Unavailable,
}

/// Ensure each requirement is met, installing the first installable
/// alternative when none is present. Installer errors are logged and
/// otherwise ignored.
pub fn ensure_tools(
    host: &HostEnvironment,
    manager: &dyn PackageManager,
    requirements: &[ToolRequirement],
) -> Vec<(String, PreflightStatus)> {
    let mut report = Vec::new();

    for requirement in requirements {
        let status = match requirement.alternatives.iter().find(|t| host.is_available(t)) {
            Some(tool) => {
                debug!("{} already present", tool);
                PreflightStatus::Present(tool.clone())
            }
            None => install_first(host, manager, requirement),
        };
        report.push((requirement.label(), status));
    }

    report
}

fn install_first(
    host: &HostEnvironment,
    manager: &dyn PackageManager,
    requirement: &ToolRequirement,
) -> PreflightStatus {
    for tool in &requirement.alternatives {
        info!("Installing {} with {}", tool, manager.name());
        match manager.install(tool) {
            Ok(()) if host.is_available(tool) => return PreflightStatus::Installed(tool.clone()),
            Ok(()) => warn!("{} reported success but {} is still missing", manager.name(), tool),
            Err(e) => warn!("Could not install {}: {:#}", tool, e),
        }
    }
    PreflightStatus::Unavailable
}

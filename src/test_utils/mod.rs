//! Test utilities for diag-collector
//!
//! [`FakeHost`] fabricates a host: a directory of fake tools and a
//! filesystem tree standing in for `/`. Fake tools are symlinks to the
//! system `echo` (prints its arguments, exits 0) or `false` (exits 1), so
//! nothing is ever written to a file that is later executed.

#![cfg(test)]

use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

use crate::collectors::host::HostEnvironment;

fn system_binary(name: &str) -> Result<PathBuf> {
    ["/usr/bin", "/bin"]
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("{} not found on this system", name))
}

/// Cheap handle able to add tools to a [`FakeHost`] from inside closures.
#[derive(Debug, Clone)]
pub struct ToolDir {
    bin: PathBuf,
}

impl ToolDir {
    pub fn install_echo(&self, tool: &str) -> Result<()> {
        symlink(system_binary("echo")?, self.bin.join(tool))?;
        Ok(())
    }

    pub fn install_false(&self, tool: &str) -> Result<()> {
        symlink(system_binary("false")?, self.bin.join(tool))?;
        Ok(())
    }

    /// Install a `/bin/sh` script as `tool`.
    ///
    /// The file is written by a child `sh`, so the test process never holds
    /// a writable descriptor on something it later executes (ETXTBSY).
    /// Only shell builtins are on the fake `PATH`.
    pub fn install_script(&self, tool: &str, body: &str) -> Result<()> {
        let path = self.bin.join(tool);
        let mut child = Command::new(system_binary("sh")?)
            .arg("-c")
            .arg("cat > \"$1\" && chmod 755 \"$1\"")
            .arg("sh")
            .arg(&path)
            .stdin(Stdio::piped())
            .spawn()?;

        {
            let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin for sh"))?;
            stdin.write_all(format!("#!/bin/sh\n{}\n", body).as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(anyhow!("failed to install script {}: {}", tool, status));
        }
        Ok(())
    }
}

/// A fabricated host rooted in a temporary directory.
pub struct FakeHost {
    _dir: TempDir,
    tools: ToolDir,
    root: PathBuf,
}

impl FakeHost {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let bin = dir.path().join("bin");
        let root = dir.path().join("root");
        fs::create_dir_all(&bin)?;
        fs::create_dir_all(&root)?;

        Ok(Self {
            _dir: dir,
            tools: ToolDir { bin },
            root,
        })
    }

    /// Host view with only the fake tools on the search path.
    pub fn host(&self) -> HostEnvironment {
        HostEnvironment {
            path_dirs: vec![self.tools.bin.clone()],
            fs_root: self.root.clone(),
            vars: vec![("HOME".to_string(), "/root".to_string())],
        }
    }

    pub fn clone_handle(&self) -> ToolDir {
        self.tools.clone()
    }

    pub fn install_echo(&self, tool: &str) -> Result<()> {
        self.tools.install_echo(tool)
    }

    pub fn install_false(&self, tool: &str) -> Result<()> {
        self.tools.install_false(tool)
    }

    pub fn install_script(&self, tool: &str, body: &str) -> Result<()> {
        self.tools.install_script(tool, body)
    }

    /// Write a file at an absolute host path inside the fake root.
    pub fn write_host_file(&self, host_path: &str, content: &str) -> Result<()> {
        self.write_host_bytes(host_path, content.as_bytes())
    }

    pub fn write_host_bytes(&self, host_path: &str, content: &[u8]) -> Result<()> {
        let path = self.root.join(host_path.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

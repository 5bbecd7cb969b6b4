//! Shared fixtures for integration tests.
//!
//! A [`Fixture`] is a fabricated Linux host: a tool directory of symlinks
//! to `echo`/`false` and a filesystem tree standing in for `/`, plus a
//! scratch output root.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tempfile::TempDir;

use diag_collector::collectors::host::HostEnvironment;
use diag_collector::config::CollectorConfig;

/// Tools the default task catalog invokes directly
pub const CATALOG_TOOLS: &[&str] = &["dmesg", "journalctl", "lspci", "numactl", "tree", "fastfetch"];

/// Outputs of a fully equipped fixture, without the report and manifest
pub const EXPECTED_TASK_FILES: &[&str] = &[
    "dmesg.txt",
    "journal.txt",
    "environment.txt",
    "meminfo.txt",
    "interrupts.txt",
    "modules.txt",
    "boot_cmdline.txt",
    "kernel_config.txt",
    "device_tree.dtb",
    "platform_devices.txt",
    "hardware_inventory.txt",
    "pci_tree.txt",
    "pci_verbose.txt",
    "numa.txt",
    "gpu_diagnostics.txt",
    "tree_boot.txt",
    "tree_lib_firmware.txt",
    "system_summary.txt",
];

fn system_binary(name: &str) -> Result<PathBuf> {
    ["/usr/bin", "/bin"]
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("{} not found on this system", name))
}

pub struct Fixture {
    _dir: TempDir,
    bin: PathBuf,
    root: PathBuf,
    output_root: PathBuf,
}

impl Fixture {
    /// Empty host: no tools, no host files.
    pub fn bare() -> Result<Self> {
        let dir = TempDir::new()?;
        let bin = dir.path().join("bin");
        let root = dir.path().join("root");
        let output_root = dir.path().join("out");
        for path in [&bin, &root, &output_root] {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            _dir: dir,
            bin,
            root,
            output_root,
        })
    }

    /// Host on which every catalog task can succeed.
    pub fn equipped() -> Result<Self> {
        let fixture = Self::bare()?;

        for tool in CATALOG_TOOLS {
            fixture.install_echo(tool)?;
        }

        fixture.write_host_file("/proc/meminfo", "MemTotal:       16384000 kB\n")?;
        fixture.write_host_file("/proc/interrupts", "           CPU0\n  0:         42   IO-APIC    2-edge      timer\n")?;
        fixture.write_host_file("/proc/modules", "nvidia 56893440 0 - Live 0x0000000000000000\n")?;
        fixture.write_host_file("/proc/cmdline", "BOOT_IMAGE=/vmlinuz root=/dev/sda1 ro quiet\n")?;
        fixture.write_host_file("/proc/sys/kernel/osrelease", "6.1.0-test\n")?;
        fixture.write_host_file("/boot/config-6.1.0-test", "CONFIG_PCI=y\n")?;
        fixture.write_host_bytes("/sys/firmware/fdt", &[0xd0, 0x0d, 0xfe, 0xed])?;
        fixture.write_host_file("/sys/bus/platform/devices/serial8250", "")?;

        Ok(fixture)
    }

    pub fn host(&self) -> HostEnvironment {
        HostEnvironment {
            path_dirs: vec![self.bin.clone()],
            fs_root: self.root.clone(),
            vars: vec![
                ("HOME".to_string(), "/root".to_string()),
                ("LANG".to_string(), "C.UTF-8".to_string()),
            ],
        }
    }

    /// Configuration writing into this fixture's output root, with
    /// preflight and archival off.
    pub fn config(&self) -> CollectorConfig {
        CollectorConfig {
            output_root: self.output_root.display().to_string(),
            archive: false,
            auto_install: false,
            ..CollectorConfig::default()
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn install_echo(&self, tool: &str) -> Result<()> {
        symlink(system_binary("echo")?, self.bin.join(tool))?;
        Ok(())
    }

    pub fn install_false(&self, tool: &str) -> Result<()> {
        symlink(system_binary("false")?, self.bin.join(tool))?;
        Ok(())
    }

    pub fn remove_tool(&self, tool: &str) -> Result<()> {
        fs::remove_file(self.bin.join(tool))?;
        Ok(())
    }

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

/// Manifest entry lines, header excluded.
pub fn manifest_entries(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect())
}

/// The `<path>` column of a manifest line.
pub fn manifest_path_column(line: &str) -> String {
    line.split(" | ").nth(1).unwrap_or_default().to_string()
}

/// File names directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}

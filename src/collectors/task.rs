use std::fmt::Write as _;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use anyhow::{anyhow, Context, Result};
use log::debug;

use crate::collectors::host::HostEnvironment;
use crate::constants::BANNER_RULE;

/// An external program together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// One block of an aggregated task.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionSource {
    Command(Invocation),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub source: SectionSource,
}

impl Section {
    pub fn command(program: &str, args: &[&str]) -> Self {
        let invocation = Invocation::new(program, args);
        Self {
            title: invocation.display(),
            source: SectionSource::Command(invocation),
        }
    }

    pub fn file(path: &str) -> Self {
        Self {
            title: path.to_string(),
            source: SectionSource::File(PathBuf::from(path)),
        }
    }
}

/// Where a task's output comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSource {
    /// Standard output of a program
    Command(Invocation),
    /// The first available program of the list
    FirstAvailable(Vec<Invocation>),
    /// Raw bytes of a host file
    HostFile(PathBuf),
    /// Sorted entry listing of a host directory
    DirListing(PathBuf),
    /// `tree -a` over a host subtree
    Tree(PathBuf),
    /// Environment snapshot of the host
    Environment,
    /// Several sub-sources concatenated under banners
    Aggregate(Vec<Section>),
}

/// Descriptor of a collection task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub file_stem: String,
    pub extension: String,
    pub source: TaskSource,
}

impl Task {
    pub fn new(name: &str, description: &str, source: TaskSource) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            file_stem: name.to_string(),
            extension: "txt".to_string(),
            source,
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Tool that must be present for this task to run, if any.
    ///
    /// Aggregated tasks have no hard requirement: missing sub-commands are
    /// reported inline.
    pub fn required_tool(&self) -> Option<String> {
        match &self.source {
            TaskSource::Command(invocation) => Some(invocation.program.clone()),
            TaskSource::Tree(_) => Some("tree".to_string()),
            TaskSource::FirstAvailable(candidates) => Some(
                candidates
                    .iter()
                    .map(|c| c.program.as_str())
                    .collect::<Vec<_>>()
                    .join(" or "),
            ),
            _ => None,
        }
    }

    /// Check that the task can run on `host`.
    pub fn check_capability(&self, host: &HostEnvironment) -> Result<()> {
        match &self.source {
            TaskSource::Command(invocation) => ensure_tool(host, &invocation.program),
            TaskSource::Tree(_) => ensure_tool(host, "tree"),
            TaskSource::FirstAvailable(candidates) => {
                if candidates.iter().any(|c| host.is_available(&c.program)) {
                    Ok(())
                } else {
                    Err(anyhow!("command not found: {}", self.required_tool().unwrap_or_default()))
                }
            }
            TaskSource::HostFile(path) | TaskSource::DirListing(path) => {
                let resolved = host.host_path(path);
                if resolved.exists() {
                    Ok(())
                } else {
                    Err(anyhow!("source not found: {}", path.display()))
                }
            }
            TaskSource::Environment | TaskSource::Aggregate(_) => Ok(()),
        }
    }

    /// Write the task's output to `dest` and return its size in bytes.
    ///
    /// Command output and host files are streamed straight into `dest`.
    /// On error `dest` may hold partial output; the caller removes it.
    pub fn write_output(&self, host: &HostEnvironment, dest: &Path) -> Result<u64> {
        match &self.source {
            TaskSource::Command(invocation) => run_to_file(host, invocation, dest),
            TaskSource::FirstAvailable(candidates) => {
                let invocation = candidates
                    .iter()
                    .find(|c| host.is_available(&c.program))
                    .ok_or_else(|| anyhow!("command not found: {}", self.required_tool().unwrap_or_default()))?;
                run_to_file(host, invocation, dest)
            }
            TaskSource::HostFile(path) => {
                let mut source = File::open(host.host_path(path))
                    .context(format!("cannot read {}", path.display()))?;
                let mut out = create_output(dest)?;
                io::copy(&mut source, &mut out).context(format!("cannot read {}", path.display()))
            }
            TaskSource::DirListing(path) => write_bytes(dest, &list_directory(&host.host_path(path), path)?),
            TaskSource::Tree(path) => {
                let resolved = host.host_path(path);
                let invocation = Invocation {
                    program: "tree".to_string(),
                    args: vec!["-a".to_string(), resolved.to_string_lossy().to_string()],
                };
                run_to_file(host, &invocation, dest)
            }
            TaskSource::Environment => {
                let mut out = String::new();
                for (key, value) in &host.vars {
                    let _ = writeln!(out, "{}={}", key, value);
                }
                write_bytes(dest, out.as_bytes())
            }
            TaskSource::Aggregate(sections) => write_bytes(dest, &render_aggregate(host, sections)),
        }
    }
}

fn create_output(dest: &Path) -> Result<File> {
    File::create(dest).context(format!("cannot write {}", display_name(dest)))
}

fn write_bytes(dest: &Path, bytes: &[u8]) -> Result<u64> {
    fs::write(dest, bytes).context(format!("cannot write {}", display_name(dest)))?;
    Ok(bytes.len() as u64)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn ensure_tool(host: &HostEnvironment, tool: &str) -> Result<()> {
    if host.is_available(tool) {
        Ok(())
    } else {
        Err(anyhow!("command not found: {}", tool))
    }
}

fn spawn(host: &HostEnvironment, invocation: &Invocation) -> Result<Output> {
    let program = host
        .locate(&invocation.program)
        .ok_or_else(|| anyhow!("command not found: {}", invocation.program))?;

    debug!("Running {}", invocation.display());

    host.command(&program)
        .args(&invocation.args)
        .output()
        .context(format!("failed to execute {}", invocation.program))
}

/// Run a program with stdout redirected into `dest`, failing on a non-zero
/// exit. Only stderr is kept in memory.
fn run_to_file(host: &HostEnvironment, invocation: &Invocation, dest: &Path) -> Result<u64> {
    let program = host
        .locate(&invocation.program)
        .ok_or_else(|| anyhow!("command not found: {}", invocation.program))?;
    let out = create_output(dest)?;

    debug!("Running {} > {}", invocation.display(), display_name(dest));

    let output = host
        .command(&program)
        .args(&invocation.args)
        .stdout(Stdio::from(out))
        .stderr(Stdio::piped())
        .output()
        .context(format!("failed to execute {}", invocation.program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().next().unwrap_or("").trim();
        return Err(if detail.is_empty() {
            anyhow!("{} exited with {}", invocation.program, output.status)
        } else {
            anyhow!("{} exited with {}: {}", invocation.program, output.status, detail)
        });
    }

    Ok(fs::metadata(dest)
        .context(format!("cannot stat {}", display_name(dest)))?
        .len())
}

fn list_directory(resolved: &Path, shown: &Path) -> Result<Vec<u8>> {
    let mut names: Vec<String> = fs::read_dir(resolved)
        .context(format!("cannot read {}", shown.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            match fs::read_link(entry.path()) {
                Ok(target) => format!("{} -> {}", name, target.display()),
                Err(_) => name,
            }
        })
        .collect();
    names.sort();

    let mut out = String::new();
    for name in names {
        out.push_str(&name);
        out.push('\n');
    }
    Ok(out.into_bytes())
}

/// Concatenate every section under a banner, reporting problems inline.
pub fn render_aggregate(host: &HostEnvironment, sections: &[Section]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();

    for section in sections {
        out.extend_from_slice(format!("{} {} {}\n", BANNER_RULE, section.title, BANNER_RULE).as_bytes());

        match &section.source {
            SectionSource::Command(invocation) => {
                if !host.is_available(&invocation.program) {
                    out.extend_from_slice(format!("WARNING: {} not found\n", invocation.program).as_bytes());
                } else {
                    match spawn(host, invocation) {
                        Ok(output) => {
                            out.extend_from_slice(&output.stdout);
                            out.extend_from_slice(&output.stderr);
                            if !output.status.success() {
                                out.extend_from_slice(
                                    format!("WARNING: {} exited with {}\n", invocation.program, output.status).as_bytes(),
                                );
                            }
                        }
                        Err(e) => out.extend_from_slice(format!("WARNING: {:#}\n", e).as_bytes()),
                    }
                }
            }
            SectionSource::File(path) => match fs::read(host.host_path(path)) {
                Ok(bytes) => out.extend_from_slice(&bytes),
                Err(e) => out.extend_from_slice(format!("WARNING: cannot read {}: {}\n", path.display(), e).as_bytes()),
            },
        }

        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.push(b'\n');
    }

    out
}

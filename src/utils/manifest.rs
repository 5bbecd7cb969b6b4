use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::constants::{MANIFEST_HEADER, UNKNOWN_SIZE};
use crate::models::CollectedFile;

/// Append-only manifest of every file written during a run.
///
/// The header block is written when the manifest is created, truncating any
/// manifest left by a previous run with the same identifier. Each entry is
/// appended to disk as soon as it is recorded, so an interrupted run still
/// leaves an accurate manifest of what was written before the interruption.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    relative_path: String,
    entries: Vec<CollectedFile>,
}

impl Manifest {
    /// Create the manifest file at `path` and write its header.
    ///
    /// `relative_path` is the name the manifest uses for itself in its
    /// trailing self-entry.
    pub fn create(path: &Path, relative_path: &str, identifier: &str, started_at: &str) -> Result<Self> {
        let mut header = String::new();
        for line in MANIFEST_HEADER {
            header.push_str(line);
            header.push('\n');
        }
        header.push_str(&format!("# Run: {}\n", identifier));
        header.push_str(&format!("# Started: {}\n", started_at));

        fs::write(path, header)
            .context(format!("Failed to create manifest {}", path.display()))?;

        debug!("Manifest created at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            relative_path: relative_path.to_string(),
            entries: Vec::new(),
        })
    }

    /// Append an entry to the in-memory list and to the file.
    ///
    /// The entry is kept in memory even if the disk write fails; the error is
    /// returned so the caller can report it.
    pub fn append(&mut self, entry: CollectedFile) -> Result<()> {
        let line = format_entry(&entry);
        self.entries.push(entry);

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .context(format!("Failed to open manifest {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .context(format!("Failed to append to manifest {}", self.path.display()))?;

        Ok(())
    }

    /// Append the manifest's own entry. Must be the last append of a run.
    pub fn append_self(&mut self, written_at: &str) -> Result<CollectedFile> {
        let size = fs::metadata(&self.path).ok().map(|m| m.len());
        let entry = CollectedFile {
            path: self.relative_path.clone(),
            size,
            description: "Manifest of collected files".to_string(),
            written_at: written_at.to_string(),
        };
        self.append(entry.clone())?;
        Ok(entry)
    }

    pub fn entries(&self) -> &[CollectedFile] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render one manifest line: `<timestamp> | <path> | <size> bytes | <description>`.
pub fn format_entry(entry: &CollectedFile) -> String {
    let size = entry
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNKNOWN_SIZE.to_string());
    format!(
        "{} | {} | {} bytes | {}",
        entry.written_at, entry.path, size, entry.description
    )
}

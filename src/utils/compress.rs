use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use async_compression::tokio::write::GzipEncoder;
use log::{debug, info, warn};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::runtime::Runtime;
use walkdir::WalkDir;

use crate::constants::{ARCHIVE_BUFFER_SIZE, ARCHIVE_STAGING_SUFFIX, ARCHIVE_SUFFIX};

/// Location of the archive for a run directory: `<parent>/<identifier>_logs.tar.gz`.
pub fn archive_path(output_dir: &Path, identifier: &str) -> Result<PathBuf> {
    Ok(parent_dir(output_dir)?.join(format!("{}{}", identifier, ARCHIVE_SUFFIX)))
}

fn parent_dir(output_dir: &Path) -> Result<&Path> {
    output_dir
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", output_dir.display()))
}

/// Add `source_dir` to `builder`, entries rooted at `root_name/`.
///
/// Entries are added in sorted order so two archives of the same tree list
/// their members identically. Symlinks are stored as links. File contents
/// are streamed by the builder, never loaded whole.
fn append_tree<W: Write>(builder: &mut tar::Builder<W>, source_dir: &Path, root_name: &str) -> Result<()> {
    builder.follow_symlinks(false);

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.context(format!("Failed to walk {}", source_dir.display()))?;
        let rel_path = entry
            .path()
            .strip_prefix(source_dir)
            .unwrap_or(entry.path());
        let archive_name = Path::new(root_name).join(rel_path);

        if entry.file_type().is_dir() {
            builder
                .append_dir(&archive_name, entry.path())
                .context(format!("Failed to add directory {}", archive_name.display()))?;
        } else {
            builder
                .append_path_with_name(entry.path(), &archive_name)
                .context(format!("Failed to add {}", archive_name.display()))?;
            debug!("Archived {}", archive_name.display());
        }
    }

    Ok(())
}

/// Build an uncompressed tar stream of `source_dir` in memory.
pub fn build_tar(source_dir: &Path, root_name: &str) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    append_tree(&mut builder, source_dir, root_name)?;
    builder.into_inner().context("Failed to finalize tar stream")
}

/// Write the tar of `source_dir` to `dest` through a fixed-size buffer.
fn write_tar_file(source_dir: &Path, root_name: &str, dest: &Path) -> Result<()> {
    let file = File::create(dest)
        .context(format!("Failed to create {}", dest.display()))?;

    let mut builder = tar::Builder::new(BufWriter::with_capacity(ARCHIVE_BUFFER_SIZE, file));
    append_tree(&mut builder, source_dir, root_name)?;

    let mut writer = builder.into_inner().context("Failed to finalize tar stream")?;
    writer.flush().context(format!("Failed to write {}", dest.display()))?;
    Ok(())
}

/// Gzip `source` into `dest` chunk by chunk.
async fn gzip_file(source: &Path, dest: &Path) -> Result<()> {
    let input = tokio::fs::File::open(source)
        .await
        .context(format!("Failed to open {}", source.display()))?;
    let output = tokio::fs::File::create(dest)
        .await
        .context(format!("Failed to create archive {}", dest.display()))?;

    let mut reader = BufReader::with_capacity(ARCHIVE_BUFFER_SIZE, input);
    let mut encoder = GzipEncoder::new(output);

    tokio::io::copy(&mut reader, &mut encoder)
        .await
        .context("Failed to write compressed archive")?;
    encoder
        .shutdown()
        .await
        .context("Failed to finalize compressed archive")?;

    Ok(())
}

fn remove_if_present(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Compress a run directory into `<identifier>_logs.tar.gz` next to it.
///
/// The tar is staged as `<identifier>_logs.tar.partial` in the same parent
/// directory and gzipped from there, so memory use does not grow with the
/// size of the run. The staging file is always removed; a partial archive
/// is removed on error.
///
/// Returns the archive path and its size in bytes.
pub fn archive_output(output_dir: &Path, identifier: &str) -> Result<(PathBuf, u64)> {
    let start = Instant::now();
    let path = archive_path(output_dir, identifier)?;
    let staging = parent_dir(output_dir)?.join(format!("{}{}", identifier, ARCHIVE_STAGING_SUFFIX));

    info!("Archiving {} to {}", output_dir.display(), path.display());

    let result = write_tar_file(output_dir, identifier, &staging).and_then(|()| {
        let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
        runtime.block_on(gzip_file(&staging, &path))
    });

    remove_if_present(&staging);
    if let Err(e) = result {
        remove_if_present(&path);
        return Err(e);
    }

    let size = fs::metadata(&path)
        .context(format!("Failed to stat archive {}", path.display()))?
        .len();

    info!("Archive written ({} bytes) in {:?}", size, start.elapsed());
    Ok((path, size))
}

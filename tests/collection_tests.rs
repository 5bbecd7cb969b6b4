//! End-to-end collection runs against a fabricated host.

mod common;

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::Result;
use async_compression::tokio::bufread::GzipDecoder;
use tokio::io::{AsyncReadExt, BufReader};

use common::{file_names, manifest_entries, manifest_path_column, Fixture, EXPECTED_TASK_FILES};
use diag_collector::harness;

fn expected_files(identifier: &str) -> Vec<String> {
    EXPECTED_TASK_FILES
        .iter()
        .map(|suffix| format!("logs_{}_{}", identifier, suffix))
        .collect()
}

/// Test that a fully equipped host yields every output and no failures
#[test]
fn test_equipped_host_collects_everything() -> Result<()> {
    let fixture = Fixture::equipped()?;
    let result = harness::execute("full01", &fixture.config(), &fixture.host())?;

    assert!(result.all_succeeded(), "unexpected failures: {:?}", result.failures);
    assert_eq!(result.output_dir, fixture.output_root().join("full01"));

    let listed: Vec<String> = result.collected.iter().map(|c| c.path.clone()).collect();
    for name in expected_files("full01") {
        assert!(listed.contains(&name), "{} missing from collected files", name);

        let path = result.output_dir.join(&name);
        assert!(fs::metadata(&path)?.len() > 0, "{} is empty", name);
    }

    assert!(result.summary_text.contains("All collections succeeded."));
    Ok(())
}

/// Test that the only thing created under the output root is the run directory
#[test]
fn test_single_output_directory() -> Result<()> {
    let fixture = Fixture::equipped()?;
    harness::execute("only-one", &fixture.config(), &fixture.host())?;

    let entries: Vec<String> = fs::read_dir(fixture.output_root())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["only-one".to_string()]);

    for name in file_names(&fixture.output_root().join("only-one"))? {
        assert!(name.contains("only-one"), "{} does not embed the identifier", name);
    }
    Ok(())
}

/// Test manifest accounting: successes + report + self-entry, self-entry last
#[test]
fn test_manifest_line_accounting() -> Result<()> {
    let fixture = Fixture::equipped()?;
    fixture.remove_tool("numactl")?;

    let result = harness::execute("mf", &fixture.config(), &fixture.host())?;
    let entries = manifest_entries(&result.manifest_path)?;

    let successes = result
        .collected
        .iter()
        .filter(|c| c.path != "logs_mf_manifest.txt" && c.path != "logs_mf_report.json")
        .count();
    assert_eq!(successes, EXPECTED_TASK_FILES.len() - 1);
    assert_eq!(entries.len(), successes + 1 + 1);

    let paths: Vec<String> = entries.iter().map(|l| manifest_path_column(l)).collect();
    assert_eq!(paths.last().map(String::as_str), Some("logs_mf_manifest.txt"));
    assert_eq!(paths[paths.len() - 2], "logs_mf_report.json");
    assert!(!paths.contains(&"logs_mf_numa.txt".to_string()));
    assert!(!paths.contains(&"logs_mf_summary.txt".to_string()));

    for line in &entries {
        assert_eq!(line.split(" | ").count(), 4, "malformed manifest line: {}", line);
        assert!(line.contains(" bytes | "));
    }
    Ok(())
}

/// Test that a missing command is recorded and the run still completes
#[test]
fn test_missing_command_is_recorded() -> Result<()> {
    let fixture = Fixture::equipped()?;
    fixture.remove_tool("lspci")?;
    fixture.remove_tool("numactl")?;
    fixture.install_false("numactl")?;

    let result = harness::execute("miss", &fixture.config(), &fixture.host())?;

    let failed: Vec<&str> = result.failures.iter().map(|f| f.task.as_str()).collect();
    assert_eq!(failed, vec!["pci_tree", "pci_verbose", "numa"]);
    assert_eq!(result.failures[0].reason, "command not found: lspci");
    assert!(result.failures[2].reason.starts_with("numactl exited with"));

    for name in ["logs_miss_pci_tree.txt", "logs_miss_pci_verbose.txt", "logs_miss_numa.txt"] {
        assert!(!result.output_dir.join(name).exists(), "{} should not exist", name);
    }

    assert!(result.summary_text.contains("Failed collections (3):"));
    assert!(result.summary_text.contains("  - pci_tree: command not found: lspci"));
    Ok(())
}

/// Test that a second run with the same identifier overwrites the first
#[test]
fn test_rerun_same_identifier_overwrites() -> Result<()> {
    let fixture = Fixture::equipped()?;
    let config = fixture.config();

    let first = harness::execute("again", &config, &fixture.host())?;
    let first_entries = manifest_entries(&first.manifest_path)?;

    fixture.remove_tool("fastfetch")?;
    let second = harness::execute("again", &config, &fixture.host())?;
    let second_entries = manifest_entries(&second.manifest_path)?;

    assert_eq!(second.output_dir, first.output_dir);
    assert_eq!(second_entries.len(), first_entries.len() - 1);
    assert!(!second.output_dir.join("logs_again_system_summary.txt").exists());
    assert_eq!(second.failures.len(), 1);
    Ok(())
}

/// Test that the JSON report lists files and failures
#[test]
fn test_report_json() -> Result<()> {
    let fixture = Fixture::equipped()?;
    fixture.remove_tool("tree")?;

    let result = harness::execute("rep", &fixture.config(), &fixture.host())?;
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(result.output_dir.join("logs_rep_report.json"))?)?;

    assert_eq!(report["identifier"], "rep");
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["failures"][0]["task"], "tree_boot");
    assert_eq!(report["failures"][0]["reason"], "command not found: tree");
    assert_eq!(
        report["files"].as_array().map(Vec::len),
        Some(EXPECTED_TASK_FILES.len() - 2)
    );
    Ok(())
}

fn gunzip(path: &Path) -> Result<Vec<u8>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let file = tokio::fs::File::open(path).await?;
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).await?;
        Ok::<_, anyhow::Error>(out)
    })
}

/// Test that the archive reproduces the output directory
#[test]
fn test_archive_matches_output_directory() -> Result<()> {
    let fixture = Fixture::equipped()?;
    let mut config = fixture.config();
    config.archive = true;

    let result = harness::execute("arch", &config, &fixture.host())?;
    let (archive, size) = result.archive.clone().expect("archive should be written");

    assert_eq!(archive, fixture.output_root().join("arch_logs.tar.gz"));
    assert_eq!(size, fs::metadata(&archive)?.len());

    let mut tar = tar::Archive::new(Cursor::new(gunzip(&archive)?));
    let mut archived = BTreeSet::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().to_string();
        let file_name = name
            .strip_prefix("arch/")
            .expect("entries are rooted at the identifier")
            .to_string();

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        assert_eq!(content, fs::read(result.output_dir.join(&file_name))?);

        archived.insert(file_name);
    }

    let on_disk: BTreeSet<String> = file_names(&result.output_dir)?.into_iter().collect();
    assert_eq!(archived, on_disk);
    assert!(archived.contains("logs_arch_summary.txt"));
    Ok(())
}

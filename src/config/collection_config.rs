use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::config::env_vars::{expand_unix_vars, is_truthy};
use crate::constants::{
    DEFAULT_HISTORY_FILES, DEFAULT_TREE_ROOTS, ENV_CONFIG_PATH, ENV_NO_ARCHIVE, ENV_NO_INSTALL,
    ENV_OUTPUT_ROOT,
};

/// Runtime options of the collector.
///
/// Every field has a default, so a YAML file only needs the keys it
/// changes:
///
/// ```yaml
/// output_root: /var/tmp/diag
/// archive: false
/// tree_roots: [/boot, /sys/class/drm]
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    /// Directory in which the run directory is created
    pub output_root: String,
    /// Write `<identifier>_logs.tar.gz` after the summary
    pub archive: bool,
    /// Try to install missing optional tools before collecting
    pub auto_install: bool,
    /// Subtrees dumped with `tree`
    pub tree_roots: Vec<String>,
    /// History file names looked up in each home directory
    pub history_files: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            output_root: ".".to_string(),
            archive: true,
            auto_install: true,
            tree_roots: DEFAULT_TREE_ROOTS.iter().map(|s| s.to_string()).collect(),
            history_files: DEFAULT_HISTORY_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML config")
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Apply `DIAG_COLLECTOR_*` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_OUTPUT_ROOT).filter(|r| !r.is_empty()) {
            self.output_root = root;
        }
        if lookup(ENV_NO_ARCHIVE).is_some_and(|v| is_truthy(&v)) {
            self.archive = false;
        }
        if lookup(ENV_NO_INSTALL).is_some_and(|v| is_truthy(&v)) {
            self.auto_install = false;
        }
    }

    /// Expand `$VAR` references in path settings.
    pub fn expand_variables<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.output_root = expand_unix_vars(&self.output_root, &lookup);
        for root in &mut self.tree_roots {
            *root = expand_unix_vars(root, &lookup);
        }
    }

    pub fn output_root(&self) -> PathBuf {
        PathBuf::from(&self.output_root)
    }
}

/// Load configuration using `lookup` for environment variables.
///
/// The YAML file named by `DIAG_COLLECTOR_CONFIG` is read if set; a named
/// file that cannot be read or parsed is an error.
pub fn load_config_with<F>(lookup: F) -> Result<CollectorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
        Some(path) => CollectorConfig::from_yaml_file(Path::new(&path))?,
        None => CollectorConfig::default(),
    };

    config.apply_overrides(&lookup);
    config.expand_variables(&lookup);
    Ok(config)
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<CollectorConfig> {
    load_config_with(|name| std::env::var(name).ok())
}

//! Project configuration loaded from `.marrow/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file inside the `.marrow` directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level project configuration. Every field has a default, so a
/// missing or partial file is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub list: ListConfig,
}

/// Defaults applied by `mw list` when flags are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

fn default_limit() -> u32 {
    50
}

fn default_sort() -> String {
    "updated-desc".to_string()
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_sort: default_sort(),
        }
    }
}

/// Load the project config from `marrow_dir`, falling back to defaults
/// when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(marrow_dir: &Path) -> Result<ProjectConfig> {
    let path = marrow_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: ProjectConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

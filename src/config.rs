use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

pub const CONFIG_FILE: &str = "leafkit.toml";

/// Per-project configuration, stored as a static TOML data file at the
/// project root. Parsing is strict: unknown fields are fatal, and a config
/// that fails to parse never falls back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub project: ProjectType,
    pub lib: StyleLib,
    pub paths: InstallPaths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Expo,
    ReactNativeCli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleLib {
    Stylesheet,
    Nativewind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallPaths {
    pub ui: String,
    #[serde(default = "default_flows_path")]
    pub flows: String,
}

fn default_flows_path() -> String {
    "flows".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project: ProjectType::Expo,
            lib: StyleLib::Nativewind,
            paths: InstallPaths {
                ui: "components/ui".to_string(),
                flows: default_flows_path(),
            },
            registry_url: None,
        }
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn config_exists(root: &Path) -> bool {
    config_path(root).exists()
}

/// Read the project config. A missing file is the expected "not configured"
/// state and returns `None`; any other failure (unreadable file, parse error,
/// schema violation) is fatal.
pub fn read_config(root: &Path) -> Result<Option<ProjectConfig>> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: ProjectConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Read the project config, treating absence as the config-not-found error.
pub fn require_config(root: &Path) -> Result<ProjectConfig> {
    read_config(root)?.ok_or_else(|| CliError::ConfigNotFound.into())
}

pub fn write_config(root: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let path = config_path(root);
    let rendered = toml::to_string_pretty(config).context("failed to render leafkit.toml")?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

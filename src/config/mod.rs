//! Configuration management
//!
//! Settings are read from up to three YAML files, lowest precedence first:
//!
//! - `~/.config/entire/settings.yaml` (global)
//! - `<repo>/.entire/settings.yaml` (project, committed)
//! - `<repo>/.entire/settings.local.yaml` (local, not committed)
//!
//! Each layer only overrides the keys it sets. `ENTIRE_ENABLED`,
//! `ENTIRE_STRATEGY` and `ENTIRE_LOG_LEVEL` override all files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::strategy::MANUAL_COMMIT;

const SETTINGS_DIR: &str = ".entire";
const PROJECT_FILE: &str = "settings.yaml";
const LOCAL_FILE: &str = "settings.local.yaml";

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whether hooks should create checkpoints
    pub enabled: bool,

    /// Capture strategy name (`manual-commit` or `auto-commit`)
    pub strategy: String,

    /// Default tracing level when neither `RUST_LOG` nor `--verbose` is set
    pub log_level: String,

    /// Agent assumed for agent-response hooks that do not name one
    pub agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: MANUAL_COMMIT.to_string(),
            log_level: "info".to_string(),
            agent: "claude-code".to_string(),
        }
    }
}

/// One settings file. Absent keys leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl Settings {
    /// Reads a settings file. A missing file is an empty layer.
    pub fn read(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_saphyr::from_str(&content)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Writes the settings file, creating its directory.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let yaml = serde_saphyr::to_string(self).map_err(|e| anyhow::anyhow!("{e}"))?;
        fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl Config {
    /// Loads the effective configuration for a repository.
    pub fn load(repo_dir: &Path) -> Result<Self> {
        let mut layers = Vec::new();
        if let Some(global) = Self::global_path() {
            layers.push(global);
        }
        layers.push(Self::project_path(repo_dir));
        layers.push(Self::local_path(repo_dir));

        let mut config = Self::from_layers(&layers)?;
        config.apply_env(|key| std::env::var(key).ok());
        tracing::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// Merges settings files in order, later files winning.
    pub fn from_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut config = Self::default();
        for path in paths {
            config.overlay(Settings::read(path)?);
        }
        Ok(config)
    }

    /// Applies one layer on top of the current values.
    pub fn overlay(&mut self, settings: Settings) {
        if let Some(enabled) = settings.enabled {
            self.enabled = enabled;
        }
        if let Some(strategy) = settings.strategy {
            self.strategy = strategy;
        }
        if let Some(level) = settings.log_level {
            self.log_level = level;
        }
        if let Some(agent) = settings.agent {
            self.agent = agent;
        }
    }

    /// Applies `ENTIRE_*` overrides read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = var("ENTIRE_ENABLED") {
            self.enabled = matches!(enabled.trim().to_lowercase().as_str(), "true" | "1");
        }
        if let Some(strategy) = var("ENTIRE_STRATEGY").filter(|s| !s.is_empty()) {
            self.strategy = strategy;
        }
        if let Some(level) = var("ENTIRE_LOG_LEVEL").filter(|s| !s.is_empty()) {
            self.log_level = level;
        }
    }

    /// Rewrites the project settings file through `edit`, keeping keys
    /// `edit` does not touch.
    pub fn update_project(repo_dir: &Path, edit: impl FnOnce(&mut Settings)) -> Result<()> {
        let path = Self::project_path(repo_dir);
        let mut settings = Settings::read(&path)?;
        edit(&mut settings);
        settings.write(&path)
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("entire").join(PROJECT_FILE))
    }

    pub fn project_path(repo_dir: &Path) -> PathBuf {
        repo_dir.join(SETTINGS_DIR).join(PROJECT_FILE)
    }

    pub fn local_path(repo_dir: &Path) -> PathBuf {
        repo_dir.join(SETTINGS_DIR).join(LOCAL_FILE)
    }
}

//! Analyzer settings and workspace layout.
//!
//! Settings live in an optional `.recovercheck.yaml` (or `.yml` / `.json`)
//! at the workspace root. A missing file means defaults.

pub mod layout;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use layout::WorkspaceLayout;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML settings at {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid JSON settings at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Options recognized by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Exclude `*_test.go` units from checking. They can still be loaded to
    /// resolve symbols they define.
    pub skip_test_files: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Json,
}

impl SettingsFormat {
    /// Format implied by a file extension (`yaml`, `yml`, `json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

impl Settings {
    /// Load settings from the first settings file present in `layout`, or
    /// defaults when there is none.
    pub fn load(layout: &WorkspaceLayout) -> Result<Self, ConfigError> {
        match layout.settings_candidates().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::parse(path, &body)
    }

    fn parse(path: &Path, body: &str) -> Result<Self, ConfigError> {
        match SettingsFormat::from_path(path) {
            Some(SettingsFormat::Json) => serde_json::from_str(body)
                .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source }),
            // An empty YAML document deserializes as null.
            _ if body.trim().is_empty() => Ok(Self::default()),
            _ => serde_yaml::from_str(body)
                .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source }),
        }
    }

    pub fn render(&self, format: SettingsFormat) -> String {
        match format {
            SettingsFormat::Yaml => serde_yaml::to_string(self).unwrap_or_default(),
            SettingsFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontend configuration.

use crate::env;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml { path: PathBuf, source: toml::de::Error },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("unsupported config format (expected .toml or .json): {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("no data directory configured (set DISTCI_CONFIG or DISTCI_DATA_DIR)")]
    MissingDataDirectory,
}

/// Settings for one frontend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the on-disk stores
    pub data_directory: PathBuf,
    /// Base URLs of the task frontends builds are forwarded to
    pub task_frontends: Vec<String>,
    /// Limit on each task frontend call
    pub dispatch_timeout: Duration,
}

/// On-disk shape of a config file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_directory: PathBuf,
    #[serde(default)]
    task_frontends: Vec<String>,
    dispatch_timeout_ms: Option<u64>,
}

impl Config {
    /// Local-only configuration over `data_directory`.
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            task_frontends: Vec::new(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    ci_core::setters! {
        into {
            task_frontends: Vec<String>,
        }
        set {
            dispatch_timeout: Duration,
        }
    }

    /// Read a `.toml` or `.json` config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let file: ConfigFile = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::from_str(&raw).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })?
            }
            Some("json") => {
                serde_json::from_str(&raw).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?
            }
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        Ok(Self {
            data_directory: file.data_directory,
            task_frontends: file.task_frontends,
            dispatch_timeout: file.dispatch_timeout_ms.map(Duration::from_millis).unwrap_or(DEFAULT_DISPATCH_TIMEOUT),
        })
    }

    /// Load configuration from the environment.
    ///
    /// `DISTCI_CONFIG` names a config file. Without it, `DISTCI_DATA_DIR`,
    /// `DISTCI_TASK_FRONTENDS` and `DISTCI_DISPATCH_TIMEOUT_MS` are used.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = env::config_path() {
            return Self::from_file(&path);
        }
        let data_directory = env::data_dir().ok_or(ConfigError::MissingDataDirectory)?;
        Ok(Self::new(data_directory).task_frontends(env::task_frontends()).dispatch_timeout(env::dispatch_timeout()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

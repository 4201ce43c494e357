// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the frontend crate.

use crate::config::DEFAULT_DISPATCH_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration file; takes precedence over the individual variables.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("DISTCI_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

pub fn data_dir() -> Option<PathBuf> {
    std::env::var("DISTCI_DATA_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Comma-separated task frontend base URLs (empty: run every build locally)
pub fn task_frontends() -> Vec<String> {
    std::env::var("DISTCI_TASK_FRONTENDS")
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

/// Timeout for one task frontend call (default 5s)
pub fn dispatch_timeout() -> Duration {
    std::env::var("DISTCI_DISPATCH_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DISPATCH_TIMEOUT)
}

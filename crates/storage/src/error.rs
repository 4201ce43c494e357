// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ci_core::{ErrorKind, InvalidTransition};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the on-disk stores
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::Conflict(_) => ErrorKind::Conflict,
            StorageError::InvalidInput(_) => ErrorKind::InvalidInput,
            StorageError::Io(_) | StorageError::Corrupt { .. } => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        StorageError::Corrupt { path: path.into(), reason: reason.to_string() }
    }
}

impl From<InvalidTransition> for StorageError {
    fn from(e: InvalidTransition) -> Self {
        StorageError::InvalidInput(e.to_string())
    }
}

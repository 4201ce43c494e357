// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::Operation;
use ci_core::ErrorKind;
use ci_wire::ErrorBody;
use std::time::Duration;
use thiserror::Error;

/// Errors from forwarding an operation to a task frontend
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("task frontend {frontend} unreachable: {reason}")]
    Unreachable { frontend: String, reason: String },

    #[error("task frontend {frontend} timed out after {after:?} during {operation}")]
    TimedOut { frontend: String, operation: Operation, after: Duration },

    #[error("unknown task frontend: {0}")]
    UnknownFrontend(String),

    #[error("task frontend {frontend} rejected the request: {body}")]
    Remote { frontend: String, body: ErrorBody },

    #[error("task frontend {frontend} sent an invalid response: {reason}")]
    Protocol { frontend: String, reason: String },

    #[error("invalid task frontend URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl DispatchError {
    /// Error kind surfaced to callers. A remote error keeps the kind the
    /// peer reported; everything that prevents an answer is `Unavailable`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Remote { body, .. } => body.error,
            DispatchError::InvalidEndpoint { .. } => ErrorKind::InvalidInput,
            DispatchError::Unreachable { .. }
            | DispatchError::TimedOut { .. }
            | DispatchError::UnknownFrontend(_)
            | DispatchError::Protocol { .. } => ErrorKind::Unavailable,
        }
    }
}

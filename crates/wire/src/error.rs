// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ci_core::ErrorKind;
use serde::{Deserialize, Serialize};

/// Structured error body returned with every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self { error, message: message.into() }
    }

    /// Transport status paired with this body.
    pub fn status(&self) -> u16 {
        status_for_kind(self.error)
    }

    /// Interpret a failed response from a peer.
    ///
    /// Peers speaking this protocol send an `ErrorBody`; anything else is
    /// classified by status code with the raw body as the message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => parsed,
            Err(_) => Self::new(kind_for_status(status), String::from_utf8_lossy(body).trim().to_string()),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

pub fn status_for_kind(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::NotFound => 404,
        ErrorKind::Conflict => 409,
        ErrorKind::Unavailable => 503,
        ErrorKind::InvalidInput => 400,
    }
}

/// Best-effort classification of a status code without a structured body.
pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        404 | 410 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        400 | 411 | 413 | 415 | 422 => ErrorKind::InvalidInput,
        _ => ErrorKind::Unavailable,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

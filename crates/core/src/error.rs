// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification shared by every layer.

use serde::{Deserialize, Serialize};

/// Stable, caller-visible error category.
///
/// Each crate keeps its own error enum; all of them classify into one of
/// these kinds, which is what the transport layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced job, build, or artifact does not exist
    NotFound,
    /// Operation would violate an identity uniqueness invariant
    Conflict,
    /// Storage or remote task frontend could not serve the request
    Unavailable,
    /// Malformed configuration, payload, or state transition
    InvalidInput,
}

crate::simple_display! {
    ErrorKind {
        NotFound => "not_found",
        Conflict => "conflict",
        Unavailable => "unavailable",
        InvalidInput => "invalid_input",
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact identity and metadata.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier of an artifact within one build.
    ///
    /// Allocated from a per-build counter and stable across replacements.
    pub struct ArtifactId("art-");
}

/// Content type recorded when the caller does not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Artifact whose payload is held by a task frontend rather than locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtifact {
    pub artifact_id: ArtifactId,
}

/// Metadata stored alongside (or instead of) an artifact payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub id: ArtifactId,
    pub content_type: String,
    /// Payload length in bytes
    pub size: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteArtifact>,
}

impl ArtifactMeta {
    pub fn new(id: ArtifactId, content_type: impl Into<String>, size: u64, epoch_ms: u64) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            size,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
            remote: None,
        }
    }

    /// Metadata after the payload was replaced; identity and creation time are kept.
    pub fn replaced(&self, content_type: impl Into<String>, size: u64, epoch_ms: u64) -> Self {
        Self {
            id: self.id.clone(),
            content_type: content_type.into(),
            size,
            created_at_ms: self.created_at_ms,
            updated_at_ms: epoch_ms,
            remote: self.remote.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;

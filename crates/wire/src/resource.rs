// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ci_core::{ArtifactId, BuildNumber, JobConfig, JobId};
use serde::{Deserialize, Serialize};

/// Resource created (`POST /jobs`, `POST .../builds`, `POST .../artifacts`)
pub const STATUS_CREATED: u16 = 201;
/// Resource read or replaced
pub const STATUS_OK: u16 = 200;
/// Resource deleted
pub const STATUS_NO_CONTENT: u16 = 204;

/// Body of `POST /jobs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobCreated {
    pub job_id: JobId,
    pub config: JobConfig,
}

/// Body of `POST /jobs/{job_id}/builds`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildCreated {
    pub job_id: JobId,
    pub build_number: BuildNumber,
}

/// Body of artifact create and replace responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRef {
    pub job_id: JobId,
    pub build_number: BuildNumber,
    pub artifact_id: ArtifactId,
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;

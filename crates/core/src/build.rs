// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build numbering and the build state machine.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Per-job build number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildNumber(pub u64);

impl BuildNumber {
    pub const FIRST: BuildNumber = BuildNumber(1);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing a build number from a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid build number: {0:?}")]
pub struct ParseBuildNumberError(pub String);

impl FromStr for BuildNumber {
    type Err = ParseBuildNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBuildNumberError(s.to_string());
        if !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
            return Err(err());
        }
        s.parse::<u64>().map(BuildNumber).map_err(|_| err())
    }
}

/// Lifecycle status of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Number allocated, not yet running
    Pending,
    /// Start signal delivered
    Running,
    /// Finished successfully
    Complete,
    /// Finished unsuccessfully
    Failed,
}

impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildStatus::Complete | BuildStatus::Failed)
    }

    /// Whether a build in this status may move to `next`.
    ///
    /// Terminal builds are frozen, and nothing moves back to `Pending`.
    pub fn can_transition_to(self, next: BuildStatus) -> bool {
        match (self, next) {
            (a, b) if a == b => true,
            (BuildStatus::Complete | BuildStatus::Failed, _) => false,
            (_, BuildStatus::Pending) => false,
            _ => true,
        }
    }
}

crate::simple_display! {
    BuildStatus {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
    }
}

impl FromStr for BuildStatus {
    type Err = InvalidTransition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BuildStatus::Pending),
            "running" => Ok(BuildStatus::Running),
            "complete" => Ok(BuildStatus::Complete),
            "failed" => Ok(BuildStatus::Failed),
            other => Err(InvalidTransition::UnknownStatus(other.to_string())),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("unknown build status: {0:?}")]
    UnknownStatus(String),
    #[error("build {job_id}#{number} is {from}, cannot become {to}")]
    Frozen { job_id: JobId, number: BuildNumber, from: BuildStatus, to: BuildStatus },
}

/// Where a forwarded build lives on its task frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBuild {
    pub job_id: JobId,
    pub build_number: BuildNumber,
}

/// Persisted build record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub job_id: JobId,
    pub number: BuildNumber,
    pub status: BuildStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Task frontend chosen at creation; every operation on this build goes there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_frontend: Option<String>,
    /// Remote identity, set once the start signal was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteBuild>,
}

impl Build {
    pub fn new(
        job_id: JobId,
        number: BuildNumber,
        assigned_frontend: Option<String>,
        epoch_ms: u64,
    ) -> Self {
        Self {
            job_id,
            number,
            status: BuildStatus::Pending,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
            assigned_frontend,
            remote: None,
        }
    }

    /// True when artifacts for this build are stored by this process.
    pub fn is_local(&self) -> bool {
        self.assigned_frontend.is_none()
    }

    /// Apply a status change. Returns `Ok(false)` when already in `status`.
    pub fn set_status(&mut self, status: BuildStatus, epoch_ms: u64) -> Result<bool, InvalidTransition> {
        if self.status == status {
            return Ok(false);
        }
        if !self.status.can_transition_to(status) {
            return Err(InvalidTransition::Frozen {
                job_id: self.job_id.clone(),
                number: self.number,
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at_ms = epoch_ms;
        Ok(true)
    }
}

crate::builder! {
    pub struct BuildBuilder => Build {
        into {
            job_id: JobId = "job-1",
        }
        set {
            number: BuildNumber = BuildNumber::FIRST,
            status: BuildStatus = BuildStatus::Pending,
            created_at_ms: u64 = crate::FakeClock::START_MS,
            updated_at_ms: u64 = crate::FakeClock::START_MS,
        }
        option {
            assigned_frontend: String,
            remote: RemoteBuild,
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;

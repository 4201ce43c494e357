// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, configuration document, and record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a registered job.
    ///
    /// Allocated from the registry's persisted counter, so IDs are never
    /// reused across daemon restarts.
    pub struct JobId("job-");
}

/// Opaque job configuration supplied by the caller.
///
/// Always a JSON object. Key order (including nested objects) is preserved
/// so the document is returned exactly as submitted; the core never looks
/// inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobConfig(IndexMap<String, serde_json::Value>);

impl JobConfig {
    /// Parse a configuration document from raw request bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Convert an already-parsed JSON value. Fails unless it is an object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the document back into a JSON value, order preserved.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Persisted job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub config: JobConfig,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Remote job registered on each task frontend (base URL → remote job id).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remote_jobs: BTreeMap<String, JobId>,
}

impl Job {
    pub fn new(id: JobId, config: JobConfig, epoch_ms: u64) -> Self {
        Self { id, config, created_at_ms: epoch_ms, updated_at_ms: epoch_ms, remote_jobs: BTreeMap::new() }
    }

    /// Replace the configuration with a newer version.
    ///
    /// Remote jobs were registered with the old configuration, so they are
    /// forgotten; the next build on each task frontend registers anew.
    pub fn supersede(&mut self, config: JobConfig, epoch_ms: u64) {
        self.config = config;
        self.updated_at_ms = epoch_ms;
        self.remote_jobs.clear();
    }

    /// The job this one is mirrored as on `frontend`, if it was registered there.
    pub fn remote_job(&self, frontend: &str) -> Option<&JobId> {
        self.remote_jobs.get(frontend)
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-1",
        }
        set {
            config: JobConfig = JobConfig::default(),
            created_at_ms: u64 = crate::FakeClock::START_MS,
            updated_at_ms: u64 = crate::FakeClock::START_MS,
            remote_jobs: BTreeMap<String, JobId> = BTreeMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

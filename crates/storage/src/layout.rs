// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of the data directory.
//!
//! ```text
//! <root>/jobs/.seq                                  job counter
//! <root>/jobs/<job_id>/job.json                     job record
//! <root>/builds/<job_id>/.seq                       build counter
//! <root>/builds/<job_id>/<n>/build.json             build record
//! <root>/builds/<job_id>/<n>/artifacts/.seq         artifact counter
//! <root>/builds/<job_id>/<n>/artifacts/<id>.artifact
//! ```
//!
//! Callers must only pass canonical IDs; those never contain separators.

use ci_core::{ArtifactId, BuildNumber, JobId};
use std::path::{Path, PathBuf};

pub(crate) const ARTIFACT_EXT: &str = "artifact";

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.jobs_dir().join(job_id.as_str())
    }

    pub fn job_record(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("job.json")
    }

    pub fn builds_root(&self) -> PathBuf {
        self.root.join("builds")
    }

    pub fn builds_dir(&self, job_id: &JobId) -> PathBuf {
        self.builds_root().join(job_id.as_str())
    }

    pub fn build_dir(&self, job_id: &JobId, number: BuildNumber) -> PathBuf {
        self.builds_dir(job_id).join(number.to_string())
    }

    pub fn build_record(&self, job_id: &JobId, number: BuildNumber) -> PathBuf {
        self.build_dir(job_id, number).join("build.json")
    }

    pub fn artifacts_dir(&self, job_id: &JobId, number: BuildNumber) -> PathBuf {
        self.build_dir(job_id, number).join("artifacts")
    }

    pub fn artifact_file(&self, job_id: &JobId, number: BuildNumber, artifact_id: &ArtifactId) -> PathBuf {
        self.artifacts_dir(job_id, number).join(format!("{}.{}", artifact_id, ARTIFACT_EXT))
    }
}

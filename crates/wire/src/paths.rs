// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource paths, relative to a frontend's base URL (no leading slash).

use ci_core::{ArtifactId, BuildNumber, JobId};

pub fn jobs() -> String {
    "jobs".to_string()
}

pub fn builds(job_id: &JobId) -> String {
    format!("jobs/{}/builds", job_id)
}

pub fn build(job_id: &JobId, number: BuildNumber) -> String {
    format!("jobs/{}/builds/{}", job_id, number)
}

pub fn artifacts(job_id: &JobId, number: BuildNumber) -> String {
    format!("jobs/{}/builds/{}/artifacts", job_id, number)
}

pub fn artifact(job_id: &JobId, number: BuildNumber, artifact_id: &ArtifactId) -> String {
    format!("jobs/{}/builds/{}/artifacts/{}", job_id, number, artifact_id)
}

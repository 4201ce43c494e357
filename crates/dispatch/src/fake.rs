// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory task frontend for tests.

use crate::{DispatchError, FetchedArtifact, Operation, TaskFrontend};
use async_trait::async_trait;
use ci_core::{ArtifactId, BuildNumber, ErrorKind, JobConfig, JobId, RemoteBuild};
use ci_wire::ErrorBody;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type ArtifactKey = (JobId, BuildNumber, ArtifactId);

#[derive(Default)]
struct FakeState {
    calls: Vec<Operation>,
    jobs: Vec<(JobId, JobConfig)>,
    builds: HashMap<JobId, u64>,
    artifacts: HashMap<ArtifactKey, FetchedArtifact>,
    next_artifact: u64,
    unreachable: bool,
    delay: Option<Duration>,
}

/// Fake task frontend that stores everything in memory
#[derive(Clone)]
pub struct FakeTaskFrontend {
    base_url: String,
    inner: Arc<Mutex<FakeState>>,
}

impl FakeTaskFrontend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), inner: Arc::new(Mutex::new(FakeState::default())) }
    }

    /// Operations received so far, including refused ones
    pub fn calls(&self) -> Vec<Operation> {
        self.inner.lock().calls.clone()
    }

    /// Refuse every call as if the peer were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    /// Hold every call for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    /// Configurations of the jobs registered here
    pub fn jobs(&self) -> Vec<(JobId, JobConfig)> {
        self.inner.lock().jobs.clone()
    }

    /// Drop every registered job as if the peer lost its state
    pub fn forget_jobs(&self) {
        let mut state = self.inner.lock();
        state.jobs.clear();
        state.builds.clear();
    }

    pub fn artifact_count(&self) -> usize {
        self.inner.lock().artifacts.len()
    }

    pub fn payload(&self, build: &RemoteBuild, artifact_id: &ArtifactId) -> Option<Vec<u8>> {
        let key = (build.job_id.clone(), build.build_number, artifact_id.clone());
        self.inner.lock().artifacts.get(&key).map(|a| a.payload.clone())
    }

    /// Record the call, then apply the configured failure and delay.
    async fn enter(&self, operation: Operation) -> Result<(), DispatchError> {
        let delay = {
            let mut state = self.inner.lock();
            state.calls.push(operation);
            if state.unreachable {
                return Err(DispatchError::Unreachable {
                    frontend: self.base_url.clone(),
                    reason: "connection refused".into(),
                });
            }
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn not_found(&self, what: String) -> DispatchError {
        DispatchError::Remote { frontend: self.base_url.clone(), body: ErrorBody::new(ErrorKind::NotFound, what) }
    }
}

#[async_trait]
impl TaskFrontend for FakeTaskFrontend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn start_build(
        &self,
        config: &JobConfig,
        remote_job: Option<&JobId>,
    ) -> Result<RemoteBuild, DispatchError> {
        self.enter(Operation::StartBuild).await?;
        let mut state = self.inner.lock();
        let job_id = match remote_job {
            Some(id) if state.jobs.iter().any(|(known, _)| known == id) => id.clone(),
            Some(id) => return Err(self.not_found(format!("job {}", id))),
            None => {
                let id = JobId::from_seq(state.jobs.len() as u64 + 1);
                state.jobs.push((id.clone(), config.clone()));
                id
            }
        };
        let n = state.builds.entry(job_id.clone()).or_default();
        *n += 1;
        Ok(RemoteBuild { job_id, build_number: BuildNumber(*n) })
    }

    async fn put_artifact(
        &self,
        build: &RemoteBuild,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactId, DispatchError> {
        self.enter(Operation::PutArtifact).await?;
        let mut state = self.inner.lock();
        state.next_artifact += 1;
        let id = ArtifactId::from_seq(state.next_artifact);
        let artifact = FetchedArtifact { content_type: content_type.map(str::to_string), payload: payload.to_vec() };
        state.artifacts.insert((build.job_id.clone(), build.build_number, id.clone()), artifact);
        Ok(id)
    }

    async fn get_artifact(
        &self,
        build: &RemoteBuild,
        artifact_id: &ArtifactId,
    ) -> Result<FetchedArtifact, DispatchError> {
        self.enter(Operation::GetArtifact).await?;
        let key = (build.job_id.clone(), build.build_number, artifact_id.clone());
        let found = self.inner.lock().artifacts.get(&key).cloned();
        found.ok_or_else(|| self.not_found(format!("artifact {}", artifact_id)))
    }

    async fn replace_artifact(
        &self,
        build: &RemoteBuild,
        artifact_id: &ArtifactId,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), DispatchError> {
        self.enter(Operation::ReplaceArtifact).await?;
        let key = (build.job_id.clone(), build.build_number, artifact_id.clone());
        let mut state = self.inner.lock();
        match state.artifacts.get_mut(&key) {
            Some(artifact) => {
                artifact.payload = payload.to_vec();
                if let Some(content_type) = content_type {
                    artifact.content_type = Some(content_type.to_string());
                }
                Ok(())
            }
            None => Err(self.not_found(format!("artifact {}", artifact_id))),
        }
    }

    async fn delete_artifact(&self, build: &RemoteBuild, artifact_id: &ArtifactId) -> Result<(), DispatchError> {
        self.enter(Operation::DeleteArtifact).await?;
        let key = (build.job_id.clone(), build.build_number, artifact_id.clone());
        match self.inner.lock().artifacts.remove(&key) {
            Some(_) => Ok(()),
            None => Err(self.not_found(format!("artifact {}", artifact_id))),
        }
    }

    async fn delete_build(&self, build: &RemoteBuild) -> Result<(), DispatchError> {
        self.enter(Operation::DeleteBuild).await?;
        self.inner.lock().artifacts.retain(|(job_id, number, _), _| {
            *job_id != build.job_id || *number != build.build_number
        });
        Ok(())
    }
}

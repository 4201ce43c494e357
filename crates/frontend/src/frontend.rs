// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operations a transport exposes, composed from the stores and the
//! dispatcher.
//!
//! Builds without an assigned task frontend keep their artifacts in the
//! local store. Builds with one forward every artifact call there first and
//! only mirror metadata locally once the peer accepted it, so a failed or
//! timed-out call leaves local state untouched.

use crate::{Config, FrontendError};
use ci_core::{
    ArtifactId, ArtifactMeta, Build, BuildNumber, BuildStatus, Clock, ErrorKind, Job, JobConfig, JobId,
    RemoteArtifact, RemoteBuild, SystemClock,
};
use ci_dispatch::{DispatchError, Dispatcher, Operation};
use ci_storage::Storage;
use ci_wire::{ArtifactRef, BuildCreated, JobCreated};
use tracing::{info, warn};

pub struct Frontend<C: Clock = SystemClock> {
    storage: Storage<C>,
    dispatcher: Dispatcher,
}

impl Frontend<SystemClock> {
    /// Open the data directory and connect the configured task frontends.
    pub fn open(config: &Config) -> Result<Self, FrontendError> {
        let storage = Storage::open(&config.data_directory, SystemClock)?;
        let dispatcher = Dispatcher::http(&config.task_frontends, config.dispatch_timeout)?;
        info!(
            data_directory = %config.data_directory.display(),
            task_frontends = config.task_frontends.len(),
            "frontend ready"
        );
        Ok(Self::with_parts(storage, dispatcher))
    }
}

impl<C: Clock> Frontend<C> {
    pub fn with_parts(storage: Storage<C>, dispatcher: Dispatcher) -> Self {
        Self { storage, dispatcher }
    }

    // ── Jobs ────────────────────────────────────────────────────────────

    pub fn create_job(&self, config: JobConfig) -> Result<JobCreated, FrontendError> {
        let job = self.storage.jobs.create_job(config)?;
        Ok(JobCreated { job_id: job.id, config: job.config })
    }

    /// Register a job from a raw request body, which must be a JSON object.
    pub fn create_job_from_slice(&self, body: &[u8]) -> Result<JobCreated, FrontendError> {
        let config = JobConfig::from_slice(body)
            .map_err(|e| FrontendError::InvalidInput(format!("job configuration must be a JSON object: {}", e)))?;
        self.create_job(config)
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Job, FrontendError> {
        Ok(self.storage.jobs.get_job(job_id)?)
    }

    pub fn list_jobs(&self) -> Result<Vec<JobId>, FrontendError> {
        Ok(self.storage.jobs.list_jobs()?)
    }

    pub fn update_job(&self, job_id: &JobId, config: JobConfig) -> Result<Job, FrontendError> {
        Ok(self.storage.jobs.update_job(job_id, config)?)
    }

    // ── Builds ──────────────────────────────────────────────────────────

    /// Allocate the next build of `job_id` and, if it was assigned to a
    /// task frontend, send the start signal.
    ///
    /// A failed start leaves the build `pending` and returns
    /// [`FrontendError::StartFailed`] carrying its number. Retry with
    /// [`Frontend::start_build`]; calling `create_build` again allocates
    /// another build and leaves this one pending.
    pub async fn create_build(&self, job_id: &JobId) -> Result<BuildCreated, FrontendError> {
        let job = self.storage.jobs.get_job(job_id)?;
        let build = self.storage.builds.create_build(job_id, self.dispatcher.select())?;
        let created = BuildCreated { job_id: build.job_id.clone(), build_number: build.number };

        if let Some(frontend) = &build.assigned_frontend {
            self.start_remote(&job, build.number, frontend).await?;
        }
        Ok(created)
    }

    /// Send the start signal for an assigned build that is still pending.
    pub async fn start_build(&self, job_id: &JobId, number: BuildNumber) -> Result<Build, FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        if build.remote.is_some() {
            return Ok(build);
        }
        let Some(frontend) = &build.assigned_frontend else {
            return Err(FrontendError::InvalidInput(format!("build {}#{} runs locally", job_id, number)));
        };
        if build.status != BuildStatus::Pending {
            return Err(FrontendError::InvalidInput(format!(
                "build {}#{} is {}, not pending",
                job_id, number, build.status
            )));
        }
        let job = self.storage.jobs.get_job(job_id)?;
        self.start_remote(&job, number, frontend).await
    }

    pub fn get_build(&self, job_id: &JobId, number: BuildNumber) -> Result<Build, FrontendError> {
        Ok(self.storage.builds.get_build(job_id, number)?)
    }

    pub fn list_builds(&self, job_id: &JobId) -> Result<Vec<Build>, FrontendError> {
        Ok(self.storage.builds.list_builds(job_id)?)
    }

    pub fn update_build_status(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        status: BuildStatus,
    ) -> Result<Build, FrontendError> {
        Ok(self.storage.builds.update_status(job_id, number, status)?)
    }

    /// Delete a build and its artifacts, on its task frontend first.
    pub async fn delete_build(&self, job_id: &JobId, number: BuildNumber) -> Result<(), FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        if let (Some(frontend), Some(remote)) = (&build.assigned_frontend, &build.remote) {
            let deleted = self.dispatcher.dispatch(frontend, Operation::DeleteBuild, |tf| tf.delete_build(remote)).await;
            tolerate_missing(deleted)?;
        }
        Ok(self.storage.builds.delete_build(job_id, number)?)
    }

    // ── Artifacts ───────────────────────────────────────────────────────

    pub async fn put_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactRef, FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        let meta = match remote_of(&build)? {
            None => self.storage.artifacts.put_artifact(job_id, number, payload, content_type)?,
            Some((frontend, remote)) => {
                let remote_id = self
                    .dispatcher
                    .dispatch(frontend, Operation::PutArtifact, |tf| tf.put_artifact(remote, payload, content_type))
                    .await?;
                let mirror = RemoteArtifact { artifact_id: remote_id.clone() };
                let size = payload.len() as u64;
                match self.storage.artifacts.put_remote_artifact(job_id, number, mirror, content_type, size) {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(
                            %job_id,
                            build_number = %number,
                            %frontend,
                            remote_artifact = %remote_id,
                            error = %e,
                            "artifact stored remotely but not mirrored"
                        );
                        return Err(e.into());
                    }
                }
            }
        };
        Ok(artifact_ref(job_id, number, meta.id))
    }

    /// Metadata and payload of an artifact, fetched from the task frontend
    /// when the build runs there.
    pub async fn get_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<(ArtifactMeta, Vec<u8>), FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        let Some((frontend, remote)) = remote_of(&build)? else {
            return Ok(self.storage.artifacts.get_artifact(job_id, number, artifact_id)?);
        };

        let meta = self.storage.artifacts.get_meta(job_id, number, artifact_id)?;
        let remote_id = mirrored_id(&meta)?;
        let fetched = self
            .dispatcher
            .dispatch(frontend, Operation::GetArtifact, |tf| tf.get_artifact(remote, remote_id))
            .await?;
        Ok((meta, fetched.payload))
    }

    pub async fn replace_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactRef, FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        let meta = match remote_of(&build)? {
            None => self.storage.artifacts.replace_artifact(job_id, number, artifact_id, payload, content_type)?,
            Some((frontend, remote)) => {
                let current = self.storage.artifacts.get_meta(job_id, number, artifact_id)?;
                let remote_id = mirrored_id(&current)?;
                self.dispatcher
                    .dispatch(frontend, Operation::ReplaceArtifact, |tf| {
                        tf.replace_artifact(remote, remote_id, payload, content_type)
                    })
                    .await?;
                let size = payload.len() as u64;
                match self.storage.artifacts.replace_remote_artifact(job_id, number, artifact_id, content_type, size) {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(
                            %job_id,
                            build_number = %number,
                            %artifact_id,
                            %frontend,
                            error = %e,
                            "artifact replaced remotely but mirror not updated"
                        );
                        return Err(e.into());
                    }
                }
            }
        };
        Ok(artifact_ref(job_id, number, meta.id))
    }

    pub async fn delete_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<(), FrontendError> {
        let build = self.storage.builds.get_build(job_id, number)?;
        if let Some((frontend, remote)) = remote_of(&build)? {
            let meta = self.storage.artifacts.get_meta(job_id, number, artifact_id)?;
            let remote_id = mirrored_id(&meta)?;
            let deleted = self
                .dispatcher
                .dispatch(frontend, Operation::DeleteArtifact, |tf| tf.delete_artifact(remote, remote_id))
                .await;
            tolerate_missing(deleted)?;
        }
        Ok(self.storage.artifacts.delete_artifact(job_id, number, artifact_id)?)
    }

    /// Artifact metadata of a build. Remote builds list their local mirrors.
    pub fn list_artifacts(&self, job_id: &JobId, number: BuildNumber) -> Result<Vec<ArtifactMeta>, FrontendError> {
        Ok(self.storage.artifacts.list_artifacts(job_id, number)?)
    }

    /// Start `number` on `frontend` and record where it runs.
    ///
    /// A remote job the peer no longer knows is registered again, once.
    async fn start_remote(&self, job: &Job, number: BuildNumber, frontend: &str) -> Result<Build, FrontendError> {
        let mut known_job = job.remote_job(frontend);
        let mut started = self.send_start(job, frontend, known_job).await;
        let lost = matches!(&started, Err(e) if e.kind() == ErrorKind::NotFound);
        if let Some(stale) = known_job.filter(|_| lost) {
            info!(job_id = %job.id, %frontend, remote_job = %stale, "remote job missing, registering again");
            known_job = None;
            started = self.send_start(job, frontend, None).await;
        }
        let remote = match started {
            Ok(remote) => remote,
            Err(source) => {
                warn!(job_id = %job.id, build_number = %number, %frontend, error = %source, "build left pending");
                return Err(FrontendError::StartFailed { job_id: job.id.clone(), number, source });
            }
        };

        if known_job != Some(&remote.job_id) {
            self.storage.jobs.record_remote_job(&job.id, frontend, remote.job_id.clone(), &job.config)?;
        }
        info!(
            job_id = %job.id,
            build_number = %number,
            %frontend,
            remote_job = %remote.job_id,
            remote_build = %remote.build_number,
            "build started on task frontend"
        );
        Ok(self.storage.builds.record_remote(&job.id, number, remote)?)
    }

    async fn send_start(
        &self,
        job: &Job,
        frontend: &str,
        remote_job: Option<&JobId>,
    ) -> Result<RemoteBuild, DispatchError> {
        self.dispatcher.dispatch(frontend, Operation::StartBuild, |tf| tf.start_build(&job.config, remote_job)).await
    }
}

/// Where an assigned build runs, or `None` for a local build.
fn remote_of(build: &Build) -> Result<Option<(&str, &RemoteBuild)>, FrontendError> {
    match (&build.assigned_frontend, &build.remote) {
        (None, _) => Ok(None),
        (Some(frontend), Some(remote)) => Ok(Some((frontend.as_str(), remote))),
        (Some(_), None) => Err(FrontendError::NotStarted { job_id: build.job_id.clone(), number: build.number }),
    }
}

fn mirrored_id(meta: &ArtifactMeta) -> Result<&ArtifactId, FrontendError> {
    meta.remote
        .as_ref()
        .map(|r| &r.artifact_id)
        .ok_or_else(|| FrontendError::InvalidInput(format!("artifact {} has no remote counterpart", meta.id)))
}

/// A peer that no longer has the resource is as good as a successful delete.
fn tolerate_missing(result: Result<(), DispatchError>) -> Result<(), FrontendError> {
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other.map_err(FrontendError::from),
    }
}

fn artifact_ref(job_id: &JobId, number: BuildNumber, artifact_id: ArtifactId) -> ArtifactRef {
    ArtifactRef { job_id: job_id.clone(), build_number: number, artifact_id }
}

#[cfg(test)]
#[path = "frontend_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task frontend seam.

use crate::DispatchError;
use async_trait::async_trait;
use ci_core::{ArtifactId, JobConfig, JobId, RemoteBuild};

/// Operations forwarded to a task frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    StartBuild,
    PutArtifact,
    GetArtifact,
    ReplaceArtifact,
    DeleteArtifact,
    DeleteBuild,
}

ci_core::simple_display! {
    Operation {
        StartBuild => "start_build",
        PutArtifact => "put_artifact",
        GetArtifact => "get_artifact",
        ReplaceArtifact => "replace_artifact",
        DeleteArtifact => "delete_artifact",
        DeleteBuild => "delete_build",
    }
}

/// Artifact payload as served by a task frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

/// A remote peer that executes builds and stores their artifacts.
///
/// Every method is one request; implementations never retry.
#[async_trait]
pub trait TaskFrontend: Send + Sync + 'static {
    /// Base URL this peer is configured under.
    fn base_url(&self) -> &str;

    /// Start a build of the job mirrored as `remote_job`, registering the
    /// job with `config` first when it has no remote counterpart yet.
    async fn start_build(&self, config: &JobConfig, remote_job: Option<&JobId>)
        -> Result<RemoteBuild, DispatchError>;

    async fn put_artifact(
        &self,
        build: &RemoteBuild,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactId, DispatchError>;

    async fn get_artifact(&self, build: &RemoteBuild, artifact_id: &ArtifactId)
        -> Result<FetchedArtifact, DispatchError>;

    async fn replace_artifact(
        &self,
        build: &RemoteBuild,
        artifact_id: &ArtifactId,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), DispatchError>;

    async fn delete_artifact(&self, build: &RemoteBuild, artifact_id: &ArtifactId) -> Result<(), DispatchError>;

    async fn delete_build(&self, build: &RemoteBuild) -> Result<(), DispatchError>;
}

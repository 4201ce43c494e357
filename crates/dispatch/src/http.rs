// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/1.1 client for a task frontend that speaks the resource protocol.
//!
//! One TCP connection per request. Timeouts are applied by the dispatcher
//! around the whole call, so a stalled peer cannot hold a request forever.

use crate::{DispatchError, Endpoint, FetchedArtifact, TaskFrontend};
use async_trait::async_trait;
use ci_core::{ArtifactId, JobConfig, JobId, RemoteBuild, DEFAULT_CONTENT_TYPE};
use ci_wire::{
    paths, read_response, ArtifactRef, BuildCreated, ErrorBody, HttpRequest, HttpResponse, JobCreated, Method,
    WireError, CONTENT_TYPE_JSON, STATUS_CREATED, STATUS_NO_CONTENT, STATUS_OK,
};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

pub struct HttpTaskFrontend {
    endpoint: Endpoint,
}

impl HttpTaskFrontend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn parse(url: &str) -> Result<Self, DispatchError> {
        Ok(Self::new(Endpoint::parse(url)?))
    }

    async fn send(&self, method: Method, path: &str, body: Option<(&str, &[u8])>) -> Result<HttpResponse, DispatchError> {
        let mut request = HttpRequest::new(method, self.endpoint.host(), self.endpoint.target(path));
        if let Some((content_type, bytes)) = body {
            request = request.with_body(content_type, bytes.to_vec());
        }
        debug!(frontend = %self.endpoint.url(), %method, path = %request.path, "sending request");

        let mut stream = TcpStream::connect(self.endpoint.addr()).await.map_err(|e| self.unreachable(e))?;
        stream.write_all(&request.encode()).await.map_err(|e| self.unreachable(e))?;

        let mut reader = BufReader::new(&mut stream);
        read_response(&mut reader).await.map_err(|e| match e {
            WireError::Io(e) => self.unreachable(e),
            other => self.protocol(other),
        })
    }

    /// Accept `expected` or turn the response into an error.
    fn check(&self, response: HttpResponse, expected: u16) -> Result<HttpResponse, DispatchError> {
        if response.status == expected {
            return Ok(response);
        }
        if response.is_success() {
            return Err(self.protocol(format!("expected status {}, got {}", expected, response.status)));
        }
        Err(DispatchError::Remote {
            frontend: self.endpoint.url().to_string(),
            body: ErrorBody::from_response(response.status, &response.body),
        })
    }

    fn decode<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, DispatchError> {
        response.json().map_err(|e| self.protocol(e))
    }

    fn unreachable(&self, e: impl std::fmt::Display) -> DispatchError {
        DispatchError::Unreachable { frontend: self.endpoint.url().to_string(), reason: e.to_string() }
    }

    fn protocol(&self, e: impl std::fmt::Display) -> DispatchError {
        DispatchError::Protocol { frontend: self.endpoint.url().to_string(), reason: e.to_string() }
    }

    async fn register_job(&self, config: &JobConfig) -> Result<JobId, DispatchError> {
        let body = serde_json::to_vec(config).map_err(|e| self.protocol(e))?;
        let response = self.send(Method::Post, &paths::jobs(), Some((CONTENT_TYPE_JSON, &body))).await?;
        let created: JobCreated = self.decode(&self.check(response, STATUS_CREATED)?)?;
        debug!(frontend = %self.endpoint.url(), remote_job = %created.job_id, "registered remote job");
        Ok(created.job_id)
    }
}

#[async_trait]
impl TaskFrontend for HttpTaskFrontend {
    fn base_url(&self) -> &str {
        self.endpoint.url()
    }

    async fn start_build(
        &self,
        config: &JobConfig,
        remote_job: Option<&JobId>,
    ) -> Result<RemoteBuild, DispatchError> {
        let job_id = match remote_job {
            Some(id) => id.clone(),
            None => self.register_job(config).await?,
        };
        let response = self.send(Method::Post, &paths::builds(&job_id), None).await?;
        let created: BuildCreated = self.decode(&self.check(response, STATUS_CREATED)?)?;
        Ok(RemoteBuild { job_id: created.job_id, build_number: created.build_number })
    }

    async fn put_artifact(
        &self,
        build: &RemoteBuild,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactId, DispatchError> {
        let path = paths::artifacts(&build.job_id, build.build_number);
        let body = Some((content_type.unwrap_or(DEFAULT_CONTENT_TYPE), payload));
        let response = self.send(Method::Post, &path, body).await?;
        let created: ArtifactRef = self.decode(&self.check(response, STATUS_CREATED)?)?;
        Ok(created.artifact_id)
    }

    async fn get_artifact(
        &self,
        build: &RemoteBuild,
        artifact_id: &ArtifactId,
    ) -> Result<FetchedArtifact, DispatchError> {
        let path = paths::artifact(&build.job_id, build.build_number, artifact_id);
        let response = self.check(self.send(Method::Get, &path, None).await?, STATUS_OK)?;
        Ok(FetchedArtifact { content_type: response.content_type, payload: response.body })
    }

    async fn replace_artifact(
        &self,
        build: &RemoteBuild,
        artifact_id: &ArtifactId,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), DispatchError> {
        let path = paths::artifact(&build.job_id, build.build_number, artifact_id);
        let body = Some((content_type.unwrap_or(DEFAULT_CONTENT_TYPE), payload));
        let response = self.send(Method::Put, &path, body).await?;
        let replaced: ArtifactRef = self.decode(&self.check(response, STATUS_OK)?)?;
        if replaced.artifact_id != *artifact_id {
            return Err(self.protocol(format!("replace of {} answered for {}", artifact_id, replaced.artifact_id)));
        }
        Ok(())
    }

    async fn delete_artifact(&self, build: &RemoteBuild, artifact_id: &ArtifactId) -> Result<(), DispatchError> {
        let path = paths::artifact(&build.job_id, build.build_number, artifact_id);
        self.check(self.send(Method::Delete, &path, None).await?, STATUS_NO_CONTENT)?;
        Ok(())
    }

    async fn delete_build(&self, build: &RemoteBuild) -> Result<(), DispatchError> {
        let path = paths::build(&build.job_id, build.build_number);
        self.check(self.send(Method::Delete, &path, None).await?, STATUS_NO_CONTENT)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

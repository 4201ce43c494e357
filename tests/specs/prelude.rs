// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the behavioral tests, including a minimal HTTP peer that serves
//! a real [`Frontend`] so one frontend can dispatch to another.

pub use ci_core::test_support::named_config;
pub use ci_core::{ArtifactId, BuildNumber, BuildStatus, ErrorKind, JobId};
pub use ci_frontend::{Config, Frontend, FrontendError};
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tempfile::{tempdir, TempDir};

use ci_wire::{ErrorBody, CONTENT_TYPE_JSON};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Route logs to the test writer; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A frontend over a fresh data directory with no task frontends.
pub fn local_frontend() -> (TempDir, Frontend) {
    let dir = tempdir().unwrap();
    let frontend = Frontend::open(&Config::new(dir.path())).unwrap();
    (dir, frontend)
}

/// A frontend that forwards every build to `peers`.
pub fn forwarding_frontend(peers: &[String], timeout: Duration) -> (TempDir, Frontend) {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path()).task_frontends(peers.to_vec()).dispatch_timeout(timeout);
    (dir, Frontend::open(&config).unwrap())
}

/// Base URL of a port nothing listens on.
pub async fn dead_peer_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    format!("http://{}/", listener.local_addr().unwrap())
}

/// Serve `frontend` over HTTP on an ephemeral port; returns its base URL.
pub async fn serve(frontend: Arc<Frontend>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let frontend = Arc::clone(&frontend);
            tokio::spawn(async move { handle(&frontend, stream).await });
        }
    });
    format!("http://{}/", addr)
}

struct Request {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

struct Response {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl Response {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self { status, content_type: CONTENT_TYPE_JSON.into(), body: serde_json::to_vec(value).unwrap() }
    }

    fn empty(status: u16) -> Self {
        Self { status, content_type: "text/plain".into(), body: Vec::new() }
    }

    fn encode(&self) -> Vec<u8> {
        let mut bytes = format!(
            "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

async fn handle(frontend: &Frontend, mut stream: TcpStream) {
    let Some(request) = read_request(&mut stream).await else { return };
    let response = match route(frontend, &request).await {
        Ok(response) => response,
        Err(e) => {
            let body = ErrorBody::from(&e);
            Response::json(body.status(), &body)
        }
    };
    let _ = stream.write_all(&response.encode()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let (method, path) = (parts.next()?.to_string(), parts.next()?.to_string());

    let mut content_type = None;
    let mut len = 0;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).await.ok()?;
        if header == "\r\n" || header.is_empty() {
            break;
        }
        let (name, value) = header.split_once(':')?;
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => len = value.trim().parse().ok()?,
            "content-type" => content_type = Some(value.trim().to_string()),
            _ => {}
        }
    }
    let mut body = vec![0; len];
    reader.read_exact(&mut body).await.ok()?;
    Some(Request { method, path, content_type, body })
}

fn number(raw: &str) -> Result<BuildNumber, FrontendError> {
    raw.parse().map_err(|_| FrontendError::InvalidInput(format!("bad build number {:?}", raw)))
}

async fn route(frontend: &Frontend, request: &Request) -> Result<Response, FrontendError> {
    let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
    let content_type = request.content_type.as_deref();
    let body = request.body.as_slice();

    match (request.method.as_str(), segments.as_slice()) {
        ("POST", ["jobs"]) => Ok(Response::json(201, &frontend.create_job_from_slice(body)?)),
        ("POST", ["jobs", job, "builds"]) => {
            Ok(Response::json(201, &frontend.create_build(&JobId::from(*job)).await?))
        }
        ("DELETE", ["jobs", job, "builds", n]) => {
            frontend.delete_build(&JobId::from(*job), number(n)?).await?;
            Ok(Response::empty(204))
        }
        ("POST", ["jobs", job, "builds", n, "artifacts"]) => {
            let created = frontend.put_artifact(&JobId::from(*job), number(n)?, body, content_type).await?;
            Ok(Response::json(201, &created))
        }
        ("GET", ["jobs", job, "builds", n, "artifacts", id]) => {
            let (meta, payload) =
                frontend.get_artifact(&JobId::from(*job), number(n)?, &ArtifactId::from(*id)).await?;
            Ok(Response { status: 200, content_type: meta.content_type, body: payload })
        }
        ("PUT", ["jobs", job, "builds", n, "artifacts", id]) => {
            let replaced = frontend
                .replace_artifact(&JobId::from(*job), number(n)?, &ArtifactId::from(*id), body, content_type)
                .await?;
            Ok(Response::json(200, &replaced))
        }
        ("DELETE", ["jobs", job, "builds", n, "artifacts", id]) => {
            frontend.delete_artifact(&JobId::from(*job), number(n)?, &ArtifactId::from(*id)).await?;
            Ok(Response::empty(204))
        }
        _ => Err(FrontendError::InvalidInput(format!("no route for {} {}", request.method, request.path))),
    }
}

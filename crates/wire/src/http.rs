// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 message codec for task-frontend calls.
//!
//! Requests are always sent with `Connection: close`, so one connection
//! carries one exchange. Responses are framed by Content-Length, chunked
//! transfer encoding, or connection close, in that order of preference.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Upper bound on response header lines before the message is rejected.
const MAX_HEADER_LINES: usize = 128;

/// Largest response body accepted from a peer, however it is framed.
pub const MAX_BODY_LEN: usize = 512 * 1024 * 1024;

/// Errors reading or decoding a peer's response.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

ci_core::simple_display! {
    Method {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Delete => "DELETE",
    }
}

/// Outgoing request to a task frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Host header value (`host:port`)
    pub host: String,
    /// Absolute request target, starting with `/`
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method, host: host.into(), path: path.into(), content_type: None, body: Vec::new() }
    }

    pub fn with_body(mut self, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = body;
        self
    }

    /// Serialize into request bytes ready to write to the socket.
    pub fn encode(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n",
            self.method, self.path, self.host
        );
        if let Some(ref content_type) = self.content_type {
            head.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        if self.method != Method::Get || !self.body.is_empty() {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Response from a task frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a JSON body.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, WireError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
///
/// Error statuses are returned as ordinary responses; the caller decides
/// how to classify them.
pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<HttpResponse, WireError> {
    read_limited(reader, MAX_BODY_LEN).await
}

async fn read_limited<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    max_body: usize,
) -> Result<HttpResponse, WireError> {
    let mut status_line = String::new();
    if reader.read_line(&mut status_line).await? == 0 {
        return Err(WireError::Malformed("connection closed before status line".into()));
    }

    let mut parts = status_line.split_whitespace();
    match parts.next() {
        Some(version) if version.starts_with("HTTP/1.") => {}
        _ => return Err(WireError::Malformed(format!("bad status line: {:?}", status_line.trim()))),
    }
    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| WireError::Malformed(format!("bad status code: {:?}", status_line.trim())))?;

    let mut content_length: Option<usize> = None;
    let mut content_type = None;
    let mut chunked = false;
    let mut terminated = false;
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(WireError::Malformed("connection closed inside headers".into()));
        }
        if line == "\r\n" || line == "\n" {
            terminated = true;
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(WireError::Malformed(format!("bad header: {:?}", line.trim())));
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => {
                let len = value
                    .parse()
                    .map_err(|_| WireError::Malformed(format!("bad content-length: {:?}", value)))?;
                content_length = Some(len);
            }
            "content-type" => content_type = Some(value.to_string()),
            "transfer-encoding" => chunked = value.to_ascii_lowercase().contains("chunked"),
            _ => {}
        }
    }
    if !terminated {
        return Err(WireError::Malformed("too many header lines".into()));
    }

    let body = if status == 204 || status == 304 || (100..200).contains(&status) {
        Vec::new()
    } else if chunked {
        read_chunked(reader, max_body).await?
    } else if let Some(len) = content_length {
        let mut buf = Vec::new();
        read_body(reader, len, max_body, &mut buf).await?;
        buf
    } else {
        let mut buf = Vec::new();
        (&mut *reader).take(max_body as u64 + 1).read_to_end(&mut buf).await?;
        if buf.len() > max_body {
            return Err(too_large(max_body));
        }
        buf
    };

    Ok(HttpResponse { status, content_type, body })
}

fn too_large(max_body: usize) -> WireError {
    WireError::Malformed(format!("response body exceeds {} bytes", max_body))
}

/// Append exactly `len` more bytes to `body`, growing it only as data
/// arrives. The whole body may not exceed `max_body`.
async fn read_body<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    len: usize,
    max_body: usize,
    body: &mut Vec<u8>,
) -> Result<(), WireError> {
    match body.len().checked_add(len) {
        Some(total) if total <= max_body => {}
        _ => return Err(too_large(max_body)),
    }
    let read = (&mut *reader).take(len as u64).read_to_end(body).await?;
    if read < len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(())
}

async fn read_chunked<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    max_body: usize,
) -> Result<Vec<u8>, WireError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line).await? == 0 {
            return Err(WireError::Malformed("connection closed inside chunked body".into()));
        }
        let size_field = size_line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| WireError::Malformed(format!("bad chunk size: {:?}", size_line.trim())))?;

        if size == 0 {
            // Trailer section ends with an empty line (or EOF)
            loop {
                let mut trailer = String::new();
                let n = reader.read_line(&mut trailer).await?;
                if n == 0 || trailer == "\r\n" || trailer == "\n" {
                    return Ok(body);
                }
            }
        }

        read_body(reader, size, max_body, &mut body).await?;

        let mut crlf = String::new();
        reader.read_line(&mut crlf).await?;
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

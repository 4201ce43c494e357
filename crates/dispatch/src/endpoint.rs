// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task frontend base URLs.

use crate::DispatchError;

const SCHEME: &str = "http://";
const DEFAULT_PORT: u16 = 80;

/// Parsed `http://host[:port][/prefix/]` base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    host: String,
    addr: String,
    prefix: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, DispatchError> {
        let invalid = |reason: &str| DispatchError::InvalidEndpoint { url: url.to_string(), reason: reason.into() };

        let rest = url.strip_prefix(SCHEME).ok_or_else(|| invalid("only http:// is supported"))?;
        let (host, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        if host.is_empty() || host.contains('@') {
            return Err(invalid("missing or unsupported host"));
        }
        if path.contains(['?', '#']) {
            return Err(invalid("query and fragment are not allowed"));
        }

        // IPv6 literals keep their colons inside brackets
        let port = if host.starts_with('[') {
            match host.split_once("]:") {
                Some((_, port)) => Some(port),
                None if host.ends_with(']') => None,
                None => return Err(invalid("bad IPv6 host")),
            }
        } else {
            match host.rsplit_once(':') {
                Some((name, _)) if name.is_empty() || name.contains(':') => return Err(invalid("bad host")),
                Some((_, port)) => Some(port),
                None => None,
            }
        };
        let addr = match port {
            Some(port) => {
                port.parse::<u16>().map_err(|_| invalid("bad port"))?;
                host.to_string()
            }
            None => format!("{}:{}", host, DEFAULT_PORT),
        };
        let prefix = if path.ends_with('/') { path.to_string() } else { format!("{}/", path) };

        Ok(Self { url: url.to_string(), host: host.to_string(), addr, prefix })
    }

    /// The URL as configured; used as the frontend's identity.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `Host` header value
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `host:port` to connect to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Absolute request target for a resource path relative to the base URL.
    pub fn target(&self, relative: &str) -> String {
        format!("{}{}", self.prefix, relative.trim_start_matches('/'))
    }
}

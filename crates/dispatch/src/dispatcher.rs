// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontend selection and timed forwarding.

use crate::{DispatchError, HttpTaskFrontend, Operation, TaskFrontend};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Routes operations to the configured task frontends.
///
/// A build's frontend is chosen once by [`Dispatcher::select`] and stored
/// on the build record; every later call names that frontend explicitly.
pub struct Dispatcher {
    frontends: Vec<Arc<dyn TaskFrontend>>,
    timeout: Duration,
    next: AtomicUsize,
}

impl Dispatcher {
    pub fn new(frontends: Vec<Arc<dyn TaskFrontend>>, timeout: Duration) -> Self {
        Self { frontends, timeout, next: AtomicUsize::new(0) }
    }

    /// HTTP clients for each base URL.
    pub fn http(urls: &[String], timeout: Duration) -> Result<Self, DispatchError> {
        let frontends = urls
            .iter()
            .map(|url| HttpTaskFrontend::parse(url).map(|tf| Arc::new(tf) as Arc<dyn TaskFrontend>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(frontends, timeout))
    }

    /// Dispatcher with no task frontends; every build runs locally.
    pub fn local() -> Self {
        Self::new(Vec::new(), Duration::ZERO)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn frontends(&self) -> impl Iterator<Item = &str> {
        self.frontends.iter().map(|tf| tf.base_url())
    }

    /// Frontend for a new build: round robin, `None` when none are configured.
    pub fn select(&self) -> Option<String> {
        if self.frontends.is_empty() {
            return None;
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.frontends.len();
        self.frontends.get(i).map(|tf| tf.base_url().to_string())
    }

    /// Run one call against `frontend` under the dispatch timeout.
    ///
    /// Never retries. A timeout abandons the call and reports `Unavailable`.
    pub async fn dispatch<'a, T, F>(
        &'a self,
        frontend: &str,
        operation: Operation,
        call: impl FnOnce(&'a dyn TaskFrontend) -> F,
    ) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, DispatchError>>,
    {
        let peer = self
            .frontends
            .iter()
            .find(|tf| tf.base_url() == frontend)
            .ok_or_else(|| DispatchError::UnknownFrontend(frontend.to_string()))?;

        debug!(%frontend, %operation, "dispatching");
        let result = match tokio::time::timeout(self.timeout, call(peer.as_ref())).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::TimedOut { frontend: frontend.to_string(), operation, after: self.timeout }),
        };

        match &result {
            Ok(_) => info!(%frontend, %operation, "dispatched"),
            Err(e) => warn!(%frontend, %operation, error = %e, "dispatch failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ci-dispatch: forwarding builds and artifacts to remote task frontends

mod dispatcher;
mod endpoint;
mod error;
mod http;
mod peer;

pub use dispatcher::Dispatcher;
pub use endpoint::Endpoint;
pub use error::DispatchError;
pub use http::HttpTaskFrontend;
pub use peer::{FetchedArtifact, Operation, TaskFrontend};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTaskFrontend;

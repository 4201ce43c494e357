// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ci-core: identity and record types for the DistCI frontend

pub mod macros;

pub mod artifact;
pub mod build;
pub mod clock;
pub mod error;
pub mod id;
pub mod job;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{ArtifactId, ArtifactMeta, RemoteArtifact, DEFAULT_CONTENT_TYPE};
#[cfg(any(test, feature = "test-support"))]
pub use build::BuildBuilder;
pub use build::{Build, BuildNumber, BuildStatus, InvalidTransition, ParseBuildNumberError, RemoteBuild};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::ErrorKind;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobConfig, JobId};

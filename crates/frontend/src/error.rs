// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ci_core::{BuildNumber, ErrorKind, JobId};
use ci_dispatch::DispatchError;
use ci_storage::StorageError;
use ci_wire::ErrorBody;
use thiserror::Error;

/// Errors returned by [`crate::Frontend`] operations
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The build was allocated but stays pending until `start_build` succeeds
    #[error("build {job_id}#{number} could not be started: {source}")]
    StartFailed { job_id: JobId, number: BuildNumber, source: DispatchError },

    #[error("build {job_id}#{number} has not been started on its task frontend")]
    NotStarted { job_id: JobId, number: BuildNumber },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FrontendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontendError::Storage(e) => e.kind(),
            FrontendError::Dispatch(e) => e.kind(),
            FrontendError::StartFailed { .. } | FrontendError::NotStarted { .. } => ErrorKind::Unavailable,
            FrontendError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<&FrontendError> for ErrorBody {
    fn from(e: &FrontendError) -> Self {
        ErrorBody::new(e.kind(), e.to_string())
    }
}

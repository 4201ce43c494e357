// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource protocol shared by the frontend and its task frontends.
//!
//! A task frontend speaks the same resource shape as the frontend itself:
//! JSON bodies for identities, raw bytes for artifact payloads, and a
//! structured error body for failures. Messages travel as HTTP/1.1.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod http;
pub mod paths;
mod resource;

pub use error::{kind_for_status, status_for_kind, ErrorBody};
pub use http::{read_response, HttpRequest, HttpResponse, Method, WireError, CONTENT_TYPE_JSON, MAX_BODY_LEN};
pub use resource::{ArtifactRef, BuildCreated, JobCreated, STATUS_CREATED, STATUS_NO_CONTENT, STATUS_OK};

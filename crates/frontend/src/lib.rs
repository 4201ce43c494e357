// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ci-frontend: the job, build and artifact operations of a DistCI frontend

mod config;
pub mod env;
mod error;
mod frontend;

pub use config::{Config, ConfigError, DEFAULT_DISPATCH_TIMEOUT};
pub use error::FrontendError;
pub use frontend::Frontend;

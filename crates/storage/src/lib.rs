// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ci-storage: crash-consistent on-disk stores for jobs, builds and artifacts
//!
//! There is no database. Every record is a file published by
//! write-fsync-rename, and every identity comes from a persisted counter
//! advanced under a per-scope lock.

mod artifacts;
mod envelope;
mod error;
mod layout;
mod ledger;
mod locks;
mod publish;
mod registry;
mod sequence;

pub use artifacts::ArtifactStore;
pub use error::StorageError;
pub use layout::Layout;
pub use ledger::BuildLedger;
pub use registry::JobRegistry;

use ci_core::Clock;
use locks::KeyedLocks;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// The three stores over one data directory, sharing one lock arena.
pub struct Storage<C: Clock> {
    pub jobs: JobRegistry<C>,
    pub builds: BuildLedger<C>,
    pub artifacts: ArtifactStore<C>,
    layout: Layout,
}

impl<C: Clock> Storage<C> {
    /// Open (creating if needed) the data directory at `root`.
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, StorageError> {
        let layout = Layout::new(root);
        fs::create_dir_all(layout.jobs_dir())?;
        fs::create_dir_all(layout.builds_root())?;
        info!(data_directory = %layout.root().display(), "storage opened");

        let locks = Arc::new(KeyedLocks::new());
        Ok(Self {
            jobs: JobRegistry::new(layout.clone(), Arc::clone(&locks), clock.clone()),
            builds: BuildLedger::new(layout.clone(), Arc::clone(&locks), clock.clone()),
            artifacts: ArtifactStore::new(layout.clone(), locks, clock),
            layout,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

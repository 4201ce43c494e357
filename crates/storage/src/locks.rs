// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lock arena keyed by storage path.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arena size above which idle entries are dropped on the next lookup.
const PRUNE_THRESHOLD: usize = 1024;

/// One mutex per key, created on first use.
///
/// Unrelated keys never contend, so allocation for one job does not wait
/// on another.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `key`. Lock it with `.lock()`; hold the `Arc` for the
    /// duration of the critical section.
    pub fn get(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() >= PRUNE_THRESHOLD {
            // Only the arena holds idle entries
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(key.to_path_buf()).or_default())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

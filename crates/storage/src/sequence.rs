// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted per-scope allocation counters.
//!
//! Each scope (the job table, one job's builds, one build's artifacts) is a
//! directory holding a `.seq` file with the last allocated number. The
//! read-then-commit step runs under that scope's in-process lock and an
//! exclusive advisory lock on `.seq.lock`, so it is serialized across
//! threads and processes but never across scopes.

use crate::error::StorageError;
use crate::locks::KeyedLocks;
use crate::publish::publish;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const SEQ_FILE: &str = ".seq";
const LOCK_FILE: &str = ".seq.lock";

pub(crate) struct Sequence<'a> {
    dir: PathBuf,
    locks: &'a KeyedLocks,
}

impl<'a> Sequence<'a> {
    pub fn in_dir(dir: impl Into<PathBuf>, locks: &'a KeyedLocks) -> Self {
        Self { dir: dir.into(), locks }
    }

    /// Last committed number, or 0 when nothing has been allocated.
    pub fn current(&self) -> Result<u64, StorageError> {
        let path = self.dir.join(SEQ_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => raw.trim().parse().map_err(|e| StorageError::corrupt(&path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Allocate the next number and hand it to `create`.
    ///
    /// The next number is one past the larger of the persisted counter and
    /// `floor` (the highest number still present on disk, which covers a
    /// lost counter file). The counter is committed before `create` runs, so
    /// a number is never handed out twice even if `create` fails or the
    /// process dies; such failures leave a gap instead.
    pub fn allocate<T>(
        &self,
        floor: impl FnOnce() -> Result<u64, StorageError>,
        create: impl FnOnce(u64) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        self.create_scope()?;

        let lock = self.locks.get(&self.dir);
        let _guard = lock.lock();
        let lock_file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(self.dir.join(LOCK_FILE))?;
        lock_file.lock_exclusive()?;

        let last = self.current()?.max(floor()?);
        let next = last
            .checked_add(1)
            .ok_or_else(|| StorageError::Conflict(format!("sequence exhausted in {}", self.dir.display())))?;
        publish(&self.dir.join(SEQ_FILE), next.to_string().as_bytes())?;
        debug!(scope = %self.dir.display(), seq = next, "sequence advanced");

        let result = create(next);
        // Dropping the file releases the advisory lock as well
        let _ = lock_file.unlock();
        result
    }

    /// Create the scope directory if needed. Its parent must already exist,
    /// so a scope is never recreated under a removed owner.
    fn create_scope(&self) -> Result<(), StorageError> {
        match fs::create_dir(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{} has no parent", self.dir.display())))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Highest number among the entries of `dir` that `parse` accepts (0 if none).
pub(crate) fn highest_on_disk(dir: &Path, parse: impl Fn(&str) -> Option<u64>) -> Result<u64, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut highest = 0;
    for entry in entries {
        let name = entry?.file_name();
        if let Some(n) = name.to_str().and_then(&parse) {
            highest = highest.max(n);
        }
    }
    Ok(highest)
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic publish: write to a temporary file in the same directory, fsync,
//! then rename over the destination.
//!
//! A reader that opens the destination sees either the previous content or
//! the new content in full. Concurrent publishers to the same path each use
//! their own temporary file; the last rename wins.

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Suffix of in-flight temporary files. Directory scans skip these.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Publish `bytes` at `path`, retrying once on I/O failure.
pub(crate) fn publish(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    match publish_once(path, bytes) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "publish failed, retrying once");
            publish_once(path, bytes).map_err(StorageError::Io)
        }
    }
}

fn publish_once(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other(format!("no parent directory: {}", path.display())))?;
    let tmp = tmp_path(path);

    let result = write_synced(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)).and_then(|_| sync_dir(dir));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Hidden, process- and call-unique sibling of `path`.
fn tmp_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}{}", name, std::process::id(), n, TMP_SUFFIX))
}

/// Flush directory entries (new files, renames, removals) to disk.
#[cfg(unix)]
pub(crate) fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Create a directory that must not already exist.
///
/// An existing directory means an identity was handed out twice, which the
/// allocation lock is supposed to make impossible.
pub(crate) fn create_exclusive_dir(dir: &Path) -> Result<(), StorageError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::error!(path = %dir.display(), "allocated identity already exists on disk");
            Err(StorageError::Conflict(format!("{} already exists", dir.display())))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::corrupt(path, e))?;
    publish(path, &bytes)
}

/// Read a JSON record. A missing file is `Ok(None)`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| StorageError::corrupt(path, e))
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store: build-scoped binary blobs.
//!
//! Writers publish whole files, so a reader never sees a payload that does
//! not match its header. Replace and delete of one artifact are serialized
//! so a replace cannot bring back a deleted artifact, and writes are
//! serialized with deletion of their build so they cannot bring back a
//! deleted build.

use crate::envelope::{self, EnvelopeError};
use crate::error::StorageError;
use crate::layout::{Layout, ARTIFACT_EXT};
use crate::locks::KeyedLocks;
use crate::publish::{publish, sync_dir};
use crate::sequence::{highest_on_disk, Sequence};
use ci_core::{ArtifactId, ArtifactMeta, BuildNumber, Clock, JobId, RemoteArtifact, DEFAULT_CONTENT_TYPE};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ArtifactStore<C: Clock> {
    layout: Layout,
    locks: Arc<KeyedLocks>,
    clock: C,
}

impl<C: Clock> ArtifactStore<C> {
    pub(crate) fn new(layout: Layout, locks: Arc<KeyedLocks>, clock: C) -> Self {
        Self { layout, locks, clock }
    }

    /// Store a new artifact under a freshly allocated id.
    pub fn put_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactMeta, StorageError> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
        let meta = self.allocate(job_id, number, |id, epoch_ms| {
            (ArtifactMeta::new(id, content_type, payload.len() as u64, epoch_ms), payload)
        })?;
        info!(job_id = %job_id, build_number = %number, artifact_id = %meta.id, size = meta.size, "artifact stored");
        Ok(meta)
    }

    /// Record an artifact whose payload lives on a task frontend.
    pub fn put_remote_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        remote: RemoteArtifact,
        content_type: Option<&str>,
        size: u64,
    ) -> Result<ArtifactMeta, StorageError> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
        let meta = self.allocate(job_id, number, |id, epoch_ms| {
            let mut meta = ArtifactMeta::new(id, content_type, size, epoch_ms);
            meta.remote = Some(remote);
            (meta, &[][..])
        })?;
        debug!(job_id = %job_id, build_number = %number, artifact_id = %meta.id, "remote artifact mirrored");
        Ok(meta)
    }

    pub fn get_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<(ArtifactMeta, Vec<u8>), StorageError> {
        let path = self.artifact_path(job_id, number, artifact_id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found(job_id, number, artifact_id)),
            Err(e) => return Err(e.into()),
        };
        envelope::decode(&bytes).map_err(|e| from_envelope(&path, e))
    }

    /// Metadata only; the payload is not read.
    pub fn get_meta(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<ArtifactMeta, StorageError> {
        let path = self.artifact_path(job_id, number, artifact_id)?;
        read_meta(&path)?.ok_or_else(|| not_found(job_id, number, artifact_id))
    }

    /// Replace the payload of an existing artifact, keeping its id.
    pub fn replace_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactMeta, StorageError> {
        let meta = self.rewrite(job_id, number, artifact_id, |old, epoch_ms| {
            let content_type = content_type.unwrap_or(&old.content_type).to_string();
            (old.replaced(content_type, payload.len() as u64, epoch_ms), payload)
        })?;
        info!(job_id = %job_id, build_number = %number, artifact_id = %artifact_id, size = meta.size, "artifact replaced");
        Ok(meta)
    }

    /// Refresh the mirrored metadata of a remote artifact after it was replaced remotely.
    pub fn replace_remote_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
        content_type: Option<&str>,
        size: u64,
    ) -> Result<ArtifactMeta, StorageError> {
        self.rewrite(job_id, number, artifact_id, |old, epoch_ms| {
            let content_type = content_type.unwrap_or(&old.content_type).to_string();
            (old.replaced(content_type, size, epoch_ms), &[][..])
        })
    }

    pub fn delete_artifact(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<(), StorageError> {
        let path = self.artifact_path(job_id, number, artifact_id)?;
        let lock = self.locks.get(&path);
        let _guard = lock.lock();

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found(job_id, number, artifact_id)),
            Err(e) => return Err(e.into()),
        }
        if let Some(dir) = path.parent() {
            sync_dir(dir)?;
        }
        info!(job_id = %job_id, build_number = %number, artifact_id = %artifact_id, "artifact deleted");
        Ok(())
    }

    /// Metadata of every artifact of a build, in allocation order.
    pub fn list_artifacts(&self, job_id: &JobId, number: BuildNumber) -> Result<Vec<ArtifactMeta>, StorageError> {
        self.require_build(job_id, number)?;
        let entries = match fs::read_dir(self.layout.artifacts_dir(job_id, number)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut metas = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if parse_artifact_file(&path).is_none() {
                continue;
            }
            if let Some(meta) = read_meta(&path)? {
                metas.push(meta);
            }
        }
        metas.sort_by_key(|m| m.id.seq());
        Ok(metas)
    }

    fn allocate<'p>(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        make: impl FnOnce(ArtifactId, u64) -> (ArtifactMeta, &'p [u8]),
    ) -> Result<ArtifactMeta, StorageError> {
        let dir = self.layout.artifacts_dir(job_id, number);
        self.with_build(job_id, number, || {
            Sequence::in_dir(&dir, &self.locks).allocate(
                || highest_on_disk(&dir, |name| parse_artifact_file(Path::new(name)).and_then(|id| id.seq())),
                |seq| {
                    let id = ArtifactId::from_seq(seq);
                    let path = self.layout.artifact_file(job_id, number, &id);
                    if path.exists() {
                        tracing::error!(path = %path.display(), "allocated artifact id already exists on disk");
                        return Err(StorageError::Conflict(format!("{} already exists", path.display())));
                    }
                    let (meta, payload) = make(id, self.clock.epoch_ms());
                    write_artifact(&path, &meta, payload)?;
                    Ok(meta)
                },
            )
        })
    }

    /// Replace an existing artifact file under its lock.
    fn rewrite<'p>(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
        make: impl FnOnce(&ArtifactMeta, u64) -> (ArtifactMeta, &'p [u8]),
    ) -> Result<ArtifactMeta, StorageError> {
        self.with_build(job_id, number, || {
            let path = self.artifact_path(job_id, number, artifact_id)?;
            let lock = self.locks.get(&path);
            let _guard = lock.lock();

            let old = read_meta(&path)?.ok_or_else(|| not_found(job_id, number, artifact_id))?;
            let (meta, payload) = make(&old, self.clock.epoch_ms());
            write_artifact(&path, &meta, payload)?;
            Ok(meta)
        })
    }

    /// Run `f` under the build record's lock, which `delete_build` also
    /// takes, so a write either lands before the delete or sees the build gone.
    fn with_build<T>(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let lock = self.locks.get(&self.layout.build_record(job_id, number));
        let _guard = lock.lock();
        self.require_build(job_id, number)?;
        f()
    }

    fn artifact_path(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        artifact_id: &ArtifactId,
    ) -> Result<PathBuf, StorageError> {
        if !artifact_id.is_canonical() {
            return Err(not_found(job_id, number, artifact_id));
        }
        self.require_build(job_id, number)?;
        Ok(self.layout.artifact_file(job_id, number, artifact_id))
    }

    fn require_build(&self, job_id: &JobId, number: BuildNumber) -> Result<(), StorageError> {
        if job_id.is_canonical() && number.get() > 0 && self.layout.build_record(job_id, number).is_file() {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("build {}#{}", job_id, number)))
        }
    }
}

fn write_artifact(path: &Path, meta: &ArtifactMeta, payload: &[u8]) -> Result<(), StorageError> {
    let bytes = envelope::encode(meta, payload).map_err(|e| from_envelope(path, e))?;
    publish(path, &bytes)
}

/// Header of an artifact file, or `None` if the file is gone.
fn read_meta(path: &Path) -> Result<Option<ArtifactMeta>, StorageError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    envelope::read_header(&mut BufReader::new(file)).map(Some).map_err(|e| from_envelope(path, e))
}

/// `art-<n>.artifact` → `art-<n>`; anything else (counters, temp files) → `None`.
fn parse_artifact_file(path: &Path) -> Option<ArtifactId> {
    if path.extension()? != ARTIFACT_EXT {
        return None;
    }
    let id = ArtifactId::from(path.file_stem()?.to_str()?);
    id.is_canonical().then_some(id)
}

fn from_envelope(path: &Path, e: EnvelopeError) -> StorageError {
    match e {
        EnvelopeError::Io(e) => StorageError::Io(e),
        other => StorageError::corrupt(path, other),
    }
}

fn not_found(job_id: &JobId, number: BuildNumber, artifact_id: &ArtifactId) -> StorageError {
    StorageError::NotFound(format!("artifact {} of build {}#{}", artifact_id, job_id, number))
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;

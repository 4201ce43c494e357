// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build ledger: per-job build numbering and build records.

use crate::error::StorageError;
use crate::layout::Layout;
use crate::locks::KeyedLocks;
use crate::publish::{create_exclusive_dir, read_json, sync_dir, write_json};
use crate::sequence::{highest_on_disk, Sequence};
use ci_core::{Build, BuildNumber, BuildStatus, Clock, JobId, RemoteBuild};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

static TOMBSTONE_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct BuildLedger<C: Clock> {
    layout: Layout,
    locks: Arc<KeyedLocks>,
    clock: C,
}

impl<C: Clock> BuildLedger<C> {
    pub(crate) fn new(layout: Layout, locks: Arc<KeyedLocks>, clock: C) -> Self {
        Self { layout, locks, clock }
    }

    /// Allocate the next build number for `job_id` and record the build.
    ///
    /// `assigned_frontend` is fixed here and never changes afterwards.
    pub fn create_build(&self, job_id: &JobId, assigned_frontend: Option<String>) -> Result<Build, StorageError> {
        self.require_job(job_id)?;
        let builds_dir = self.layout.builds_dir(job_id);

        let build = Sequence::in_dir(&builds_dir, &self.locks).allocate(
            || highest_on_disk(&builds_dir, |name| name.parse::<BuildNumber>().ok().map(BuildNumber::get)),
            |n| {
                let build = Build::new(job_id.clone(), BuildNumber(n), assigned_frontend, self.clock.epoch_ms());
                let dir = self.layout.build_dir(job_id, build.number);
                create_exclusive_dir(&dir)?;
                let written = fs::create_dir(self.layout.artifacts_dir(job_id, build.number))
                    .map_err(StorageError::from)
                    .and_then(|_| write_json(&self.layout.build_record(job_id, build.number), &build))
                    .and_then(|_| Ok(sync_dir(&builds_dir)?));
                if let Err(e) = written {
                    let _ = fs::remove_dir_all(&dir);
                    return Err(e);
                }
                Ok(build)
            },
        )?;

        info!(
            job_id = %build.job_id,
            build_number = %build.number,
            frontend = build.assigned_frontend.as_deref().unwrap_or("local"),
            "build created"
        );
        Ok(build)
    }

    pub fn get_build(&self, job_id: &JobId, number: BuildNumber) -> Result<Build, StorageError> {
        if !job_id.is_canonical() || number.get() == 0 {
            return Err(not_found(job_id, number));
        }
        read_json(&self.layout.build_record(job_id, number))?.ok_or_else(|| not_found(job_id, number))
    }

    /// All builds of a job, ascending by number.
    pub fn list_builds(&self, job_id: &JobId) -> Result<Vec<Build>, StorageError> {
        self.require_job(job_id)?;
        let entries = match fs::read_dir(self.layout.builds_dir(job_id)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut builds = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(number) = name.to_str().and_then(|n| n.parse::<BuildNumber>().ok()) else {
                continue;
            };
            // A build deleted between the scan and the read is simply absent.
            if let Some(build) = read_json::<Build>(&self.layout.build_record(job_id, number))? {
                builds.push(build);
            }
        }
        builds.sort_by_key(|b| b.number);
        Ok(builds)
    }

    pub fn update_status(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        status: BuildStatus,
    ) -> Result<Build, StorageError> {
        let epoch_ms = self.clock.epoch_ms();
        let mut changed = false;
        let build = self.modify(job_id, number, |build| {
            changed = build.set_status(status, epoch_ms)?;
            Ok(changed)
        })?;
        if changed {
            info!(job_id = %job_id, build_number = %number, status = %status, "build status changed");
        }
        Ok(build)
    }

    /// Record the remote identity of a started build and mark it running.
    pub fn record_remote(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        remote: RemoteBuild,
    ) -> Result<Build, StorageError> {
        let epoch_ms = self.clock.epoch_ms();
        self.modify(job_id, number, |build| {
            build.set_status(BuildStatus::Running, epoch_ms)?;
            build.remote = Some(remote);
            build.updated_at_ms = epoch_ms;
            Ok(true)
        })
    }

    /// Remove a build and its artifacts. The number stays allocated.
    pub fn delete_build(&self, job_id: &JobId, number: BuildNumber) -> Result<(), StorageError> {
        let record = self.layout.build_record(job_id, number);
        let lock = self.locks.get(&record);
        let _guard = lock.lock();

        self.get_build(job_id, number)?;
        let dir = self.layout.build_dir(job_id, number);
        let tombstone = tombstone_path(&self.layout, job_id, number);
        fs::rename(&dir, &tombstone)?;
        sync_dir(&self.layout.builds_dir(job_id))?;

        if let Err(e) = fs::remove_dir_all(&tombstone) {
            warn!(path = %tombstone.display(), error = %e, "failed to remove deleted build");
        }
        info!(job_id = %job_id, build_number = %number, "build deleted");
        Ok(())
    }

    /// Read-modify-publish under the record's lock. `f` returns whether it changed anything.
    fn modify(
        &self,
        job_id: &JobId,
        number: BuildNumber,
        f: impl FnOnce(&mut Build) -> Result<bool, StorageError>,
    ) -> Result<Build, StorageError> {
        let path = self.layout.build_record(job_id, number);
        let lock = self.locks.get(&path);
        let _guard = lock.lock();

        let mut build = self.get_build(job_id, number)?;
        if f(&mut build)? {
            write_json(&path, &build)?;
        }
        Ok(build)
    }

    fn require_job(&self, job_id: &JobId) -> Result<(), StorageError> {
        if job_id.is_canonical() && self.layout.job_record(job_id).is_file() {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("job {}", job_id)))
        }
    }
}

/// Hidden sibling a deleted build is renamed to before removal.
fn tombstone_path(layout: &Layout, job_id: &JobId, number: BuildNumber) -> PathBuf {
    let n = TOMBSTONE_COUNTER.fetch_add(1, Ordering::Relaxed);
    layout.builds_dir(job_id).join(format!(".{}.deleted.{}.{}", number, std::process::id(), n))
}

fn not_found(job_id: &JobId, number: BuildNumber) -> StorageError {
    StorageError::NotFound(format!("build {}#{}", job_id, number))
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry: durable job records and job ID allocation.

use crate::error::StorageError;
use crate::layout::Layout;
use crate::locks::KeyedLocks;
use crate::publish::{create_exclusive_dir, read_json, sync_dir, write_json};
use crate::sequence::{highest_on_disk, Sequence};
use ci_core::{Clock, Job, JobConfig, JobId};
use std::fs;
use std::sync::Arc;
use tracing::{debug, info};

pub struct JobRegistry<C: Clock> {
    layout: Layout,
    locks: Arc<KeyedLocks>,
    clock: C,
}

impl<C: Clock> JobRegistry<C> {
    pub(crate) fn new(layout: Layout, locks: Arc<KeyedLocks>, clock: C) -> Self {
        Self { layout, locks, clock }
    }

    /// Register a job. The record is on disk (and fsynced) when this returns.
    pub fn create_job(&self, config: JobConfig) -> Result<Job, StorageError> {
        let jobs_dir = self.layout.jobs_dir();
        let job = Sequence::in_dir(&jobs_dir, &self.locks).allocate(
            || highest_on_disk(&jobs_dir, |name| JobId::from(name).seq()),
            |seq| {
                let job = Job::new(JobId::from_seq(seq), config, self.clock.epoch_ms());
                let dir = self.layout.job_dir(&job.id);
                create_exclusive_dir(&dir)?;
                if let Err(e) = write_json(&self.layout.job_record(&job.id), &job).and_then(|_| {
                    sync_dir(&jobs_dir)?;
                    Ok(())
                }) {
                    let _ = fs::remove_dir_all(&dir);
                    return Err(e);
                }
                Ok(job)
            },
        )?;

        info!(job_id = %job.id, "job created");
        Ok(job)
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Job, StorageError> {
        if !job_id.is_canonical() {
            return Err(not_found(job_id));
        }
        read_json(&self.layout.job_record(job_id))?.ok_or_else(|| not_found(job_id))
    }

    pub fn exists(&self, job_id: &JobId) -> bool {
        job_id.is_canonical() && self.layout.job_record(job_id).is_file()
    }

    /// IDs of all registered jobs, in allocation order.
    pub fn list_jobs(&self) -> Result<Vec<JobId>, StorageError> {
        let entries = match fs::read_dir(self.layout.jobs_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let id = JobId::from(name);
            if self.exists(&id) {
                ids.push(id);
            }
        }
        ids.sort_by_key(|id| id.seq());
        Ok(ids)
    }

    /// Supersede a job's configuration.
    pub fn update_job(&self, job_id: &JobId, config: JobConfig) -> Result<Job, StorageError> {
        let epoch_ms = self.clock.epoch_ms();
        let job = self.modify(job_id, |job| job.supersede(config, epoch_ms))?;
        info!(job_id = %job.id, "job configuration updated");
        Ok(job)
    }

    /// Remember the remote job that mirrors `job_id` on `frontend`.
    ///
    /// `registered` is the configuration the remote job was created with.
    /// If the job has been updated since, nothing is recorded.
    pub fn record_remote_job(
        &self,
        job_id: &JobId,
        frontend: &str,
        remote_job_id: JobId,
        registered: &JobConfig,
    ) -> Result<Job, StorageError> {
        self.modify(job_id, |job| {
            if job.config == *registered {
                job.remote_jobs.insert(frontend.to_string(), remote_job_id);
            } else {
                debug!(job_id = %job.id, %frontend, "configuration changed during registration");
            }
        })
    }

    /// Read-modify-publish under the record's lock.
    fn modify(&self, job_id: &JobId, f: impl FnOnce(&mut Job)) -> Result<Job, StorageError> {
        let path = self.layout.job_record(job_id);
        let lock = self.locks.get(&path);
        let _guard = lock.lock();

        let mut job = self.get_job(job_id)?;
        f(&mut job);
        write_json(&path, &job)?;
        Ok(job)
    }
}

fn not_found(job_id: &JobId) -> StorageError {
    StorageError::NotFound(format!("job {}", job_id))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

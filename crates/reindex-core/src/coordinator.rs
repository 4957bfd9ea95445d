//! Single-flight coordination of reindex jobs.
//!
//! At most one job runs at a time. A caller that finds a job running is
//! rejected with the running job's start time; nothing is queued.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// Tracks whether a reindex job is running and since when.
///
/// Clones share the same state, so one coordinator can guard several
/// entry points.
#[derive(Debug, Clone, Default)]
pub struct JobCoordinator {
    started_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl JobCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a job now.
    ///
    /// Returns a guard that ends the job when dropped, or the start time of
    /// the job already running.
    pub fn try_acquire(&self) -> Result<JobGuard, DateTime<Utc>> {
        self.try_acquire_at(Utc::now())
    }

    /// Try to start a job with an explicit start time.
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> Result<JobGuard, DateTime<Utc>> {
        // Check and set under one lock
        let mut state = self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(running_since) = *state {
            return Err(running_since);
        }
        *state = Some(now);
        Ok(JobGuard {
            started_at: self.started_at.clone(),
            since: now,
        })
    }

    /// Start time of the running job, if any.
    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        *self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running_since().is_some()
    }
}

/// RAII guard for an accepted job. Dropping it marks the job finished.
#[derive(Debug)]
pub struct JobGuard {
    started_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    since: DateTime<Utc>,
}

impl JobGuard {
    /// When this job was accepted.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.since
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        *self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

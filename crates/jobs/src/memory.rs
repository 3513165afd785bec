//! In-memory queue for tests/dev.
//!
//! Mirrors the broker semantics: per-kind queues, backoff via delayed jobs
//! that are promoted when due, leased claims, dead jobs kept for inspection
//! and a bounded completed history. Nothing survives a restart.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::queue::{
    DEFAULT_COMPLETED_RETENTION, DEFAULT_LEASE, JobSource, QueueClient, QueueError,
};
use crate::types::{
    FailOutcome, Job, JobCounts, JobHandle, JobId, JobKind, JobOptions, JobStatus,
    LEASE_EXPIRED_REASON,
};

fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    jobs: HashMap<JobId, Job>,
    waiting: VecDeque<JobId>,
    /// Lease deadline of every active job.
    leases: HashMap<JobId, DateTime<Utc>>,
    /// Completion order, oldest first.
    completed: VecDeque<JobId>,
    /// Failure order, oldest first.
    failed: Vec<JobId>,
}

impl QueueState {
    fn recover_expired(&mut self, now: DateTime<Utc>) {
        let mut expired: Vec<(DateTime<Utc>, JobId)> = self
            .leases
            .iter()
            .filter(|(_, until)| **until <= now)
            .map(|(id, until)| (*until, id.clone()))
            .collect();
        expired.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, id) in expired {
            self.leases.remove(&id);
            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            if job.status != JobStatus::Active {
                continue;
            }

            let outcome = job.next_after_stall();
            job.attempts_made += 1;
            job.failed_reason = Some(LEASE_EXPIRED_REASON.to_string());
            match outcome {
                FailOutcome::Retrying { .. } => {
                    job.status = JobStatus::Waiting;
                    self.waiting.push_back(id);
                }
                FailOutcome::Dead { .. } => {
                    job.status = JobStatus::Failed;
                    job.finished_at = Some(now);
                    self.failed.push(id);
                }
            }
        }
    }

    fn promote_due(&mut self, now: DateTime<Utc>) {
        let mut due: Vec<(DateTime<Utc>, JobId)> = self
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Delayed)
            .filter_map(|j| j.scheduled_at.filter(|at| *at <= now).map(|at| (at, j.id.clone())))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, id) in due {
            if let Some(job) = self.jobs.get_mut(&id) {
                job.status = JobStatus::Waiting;
                job.scheduled_at = None;
                self.waiting.push_back(id);
            }
        }
    }

    fn trim_completed(&mut self, keep: usize) {
        while self.completed.len() > keep {
            if let Some(old) = self.completed.pop_front() {
                self.jobs.remove(&old);
            }
        }
    }

    fn active_mut(&mut self, kind: JobKind, id: &JobId) -> Result<&mut Job, QueueError> {
        let job = self.jobs.get_mut(id).ok_or_else(|| QueueError::NotFound {
            queue: kind,
            id: id.clone(),
        })?;
        if job.status != JobStatus::Active {
            return Err(QueueError::InvalidState {
                queue: kind,
                id: id.clone(),
                expected: JobStatus::Active.as_str(),
            });
        }
        Ok(job)
    }
}

/// In-memory `JobQueue`.
#[derive(Debug)]
pub struct InMemoryQueue {
    queues: Mutex<HashMap<JobKind, QueueState>>,
    lease: Duration,
    completed_retention: usize,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            lease: DEFAULT_LEASE,
            completed_retention: DEFAULT_COMPLETED_RETENTION,
        }
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Keep at most `keep` completed jobs per queue.
    pub fn with_completed_retention(mut self, keep: usize) -> Self {
        self.completed_retention = keep;
        self
    }

    /// Make a delayed job ready now, skipping the rest of its backoff.
    pub async fn promote(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();
        let job = state.jobs.get_mut(id).ok_or_else(|| QueueError::NotFound {
            queue: kind,
            id: id.clone(),
        })?;
        if job.status != JobStatus::Delayed {
            return Err(QueueError::InvalidState {
                queue: kind,
                id: id.clone(),
                expected: JobStatus::Delayed.as_str(),
            });
        }
        job.status = JobStatus::Waiting;
        job.scheduled_at = None;
        state.waiting.push_back(id.clone());
        Ok(())
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn enqueue(
        &self,
        kind: JobKind,
        data: serde_json::Value,
        opts: JobOptions,
    ) -> Result<JobHandle, QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();

        state.next_id += 1;
        let id = JobId::new(state.next_id.to_string());
        state
            .jobs
            .insert(id.clone(), Job::new(id.clone(), kind, data, opts));
        state.waiting.push_back(id.clone());

        Ok(JobHandle {
            job_id: id,
            queue: kind,
        })
    }
}

#[async_trait]
impl JobSource for InMemoryQueue {
    async fn claim_next(&self, kind: JobKind) -> Result<Option<Job>, QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();
        let now = Utc::now();
        state.recover_expired(now);
        state.promote_due(now);

        while let Some(id) = state.waiting.pop_front() {
            if let Some(job) = state.jobs.get_mut(&id) {
                if job.status == JobStatus::Waiting {
                    job.status = JobStatus::Active;
                    job.processed_at = Some(now);
                    let job = job.clone();
                    state.leases.insert(id, after(now, self.lease));
                    return Ok(Some(job));
                }
            }
        }

        Ok(None)
    }

    fn lease(&self) -> Duration {
        self.lease
    }

    async fn extend_lease(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();
        state.active_mut(kind, id)?;
        state.leases.insert(id.clone(), after(Utc::now(), self.lease));
        Ok(())
    }

    async fn complete(
        &self,
        kind: JobKind,
        id: &JobId,
        return_value: Option<serde_json::Value>,
    ) -> Result<(), QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();
        let job = state.active_mut(kind, id)?;

        job.status = JobStatus::Completed;
        job.finished_at = Some(Utc::now());
        job.return_value = return_value;

        state.leases.remove(id);
        state.completed.push_back(id.clone());
        state.trim_completed(self.completed_retention);
        Ok(())
    }

    async fn fail(
        &self,
        kind: JobKind,
        id: &JobId,
        reason: &str,
    ) -> Result<FailOutcome, QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();
        let job = state.active_mut(kind, id)?;

        let outcome = job.next_after_failure();
        let now = Utc::now();
        job.attempts_made += 1;
        job.failed_reason = Some(reason.to_string());

        match outcome {
            FailOutcome::Retrying { delay, .. } if delay.is_zero() => {
                job.status = JobStatus::Waiting;
                state.waiting.push_back(id.clone());
            }
            FailOutcome::Retrying { delay, .. } => {
                job.status = JobStatus::Delayed;
                job.scheduled_at = Some(after(now, delay));
            }
            FailOutcome::Dead { .. } => {
                job.status = JobStatus::Failed;
                job.finished_at = Some(now);
                state.failed.push(id.clone());
            }
        }

        state.leases.remove(id);
        Ok(outcome)
    }
    async fn get(&self, kind: JobKind, id: &JobId) -> Result<Option<Job>, QueueError> {
        let queues = self.queues.lock().await;
        Ok(queues.get(&kind).and_then(|s| s.jobs.get(id)).cloned())
    }

    async fn counts(&self, kind: JobKind) -> Result<JobCounts, QueueError> {
        let queues = self.queues.lock().await;
        let mut counts = JobCounts::default();

        if let Some(state) = queues.get(&kind) {
            for job in state.jobs.values() {
                match job.status {
                    JobStatus::Waiting => counts.waiting += 1,
                    JobStatus::Delayed => counts.delayed += 1,
                    JobStatus::Active => counts.active += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                }
            }
        }

        Ok(counts)
    }

    async fn failed(&self, kind: JobKind, limit: usize) -> Result<Vec<Job>, QueueError> {
        let queues = self.queues.lock().await;
        let Some(state) = queues.get(&kind) else {
            return Ok(Vec::new());
        };

        Ok(state
            .failed
            .iter()
            .rev()
            .filter_map(|id| state.jobs.get(id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn retry_failed(&self, kind: JobKind, id: &JobId) -> Result<Job, QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(kind).or_default();

        let job = state.jobs.get_mut(id).ok_or_else(|| QueueError::NotFound {
            queue: kind,
            id: id.clone(),
        })?;
        if job.status != JobStatus::Failed {
            return Err(QueueError::InvalidState {
                queue: kind,
                id: id.clone(),
                expected: JobStatus::Failed.as_str(),
            });
        }

        job.status = JobStatus::Waiting;
        job.attempts_made = 0;
        job.failed_reason = None;
        job.finished_at = None;
        let job = job.clone();

        state.failed.retain(|f| f != id);
        state.waiting.push_back(id.clone());
        Ok(job)
    }
}

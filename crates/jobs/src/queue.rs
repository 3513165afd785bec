//! Queue capabilities.
//!
//! `QueueClient` is the producer side (enqueue only). `JobSource` is the
//! worker/operator side: claim, settle, inspect and re-drive jobs. Concrete
//! brokers implement both; `JobQueue` names the combination.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::{FailOutcome, Job, JobCounts, JobHandle, JobId, JobKind, JobOptions};

/// How long a claim stays valid without renewal.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);

/// Completed jobs kept per queue; the oldest are dropped beyond this.
pub const DEFAULT_COMPLETED_RETENTION: usize = 1_000;

/// Queue error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("broker connection error: {0}")]
    Connection(String),
    #[error("broker command error: {0}")]
    Command(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("job {id} not found in queue {queue}")]
    NotFound { queue: JobKind, id: JobId },
    #[error("job {id} in queue {queue} is not {expected}")]
    InvalidState {
        queue: JobKind,
        id: JobId,
        expected: &'static str,
    },
    #[error("payload belongs to {actual} jobs, expected {expected}")]
    KindMismatch { expected: JobKind, actual: JobKind },
}

impl QueueError {
    /// Broker unreachable or refusing commands; callers typically answer 503.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueueError::Connection(_) | QueueError::Command(_))
    }
}

/// Producer-side capability.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Submit a job. Returns only once the broker has accepted it.
    async fn enqueue(
        &self,
        kind: JobKind,
        data: serde_json::Value,
        opts: JobOptions,
    ) -> Result<JobHandle, QueueError>;
}

/// Worker- and operator-side capability.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Claim the next waiting job, marking it active under a fresh lease.
    ///
    /// Active jobs whose lease has expired are taken back first (one attempt
    /// consumed, dead once the budget is spent), then due delayed jobs are
    /// promoted.
    async fn claim_next(&self, kind: JobKind) -> Result<Option<Job>, QueueError>;

    /// Lease granted to every claim.
    fn lease(&self) -> Duration;

    /// Push an active job's lease forward by `lease()`.
    async fn extend_lease(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError>;

    /// Settle an active job as completed.
    async fn complete(
        &self,
        kind: JobKind,
        id: &JobId,
        return_value: Option<serde_json::Value>,
    ) -> Result<(), QueueError>;

    /// Settle an active job as failed; retries or dead-letters per its options.
    async fn fail(&self, kind: JobKind, id: &JobId, reason: &str)
    -> Result<FailOutcome, QueueError>;

    async fn get(&self, kind: JobKind, id: &JobId) -> Result<Option<Job>, QueueError>;

    async fn counts(&self, kind: JobKind) -> Result<JobCounts, QueueError>;

    /// Dead jobs, most recently failed first.
    async fn failed(&self, kind: JobKind, limit: usize) -> Result<Vec<Job>, QueueError>;

    /// Operator re-drive of a dead job: attempts reset, job waiting again.
    async fn retry_failed(&self, kind: JobKind, id: &JobId) -> Result<Job, QueueError>;
}

/// A broker offering both sides.
pub trait JobQueue: QueueClient + JobSource {}

impl<T: QueueClient + JobSource + ?Sized> JobQueue for T {}

#[async_trait]
impl<T: QueueClient + ?Sized> QueueClient for Arc<T> {
    async fn enqueue(
        &self,
        kind: JobKind,
        data: serde_json::Value,
        opts: JobOptions,
    ) -> Result<JobHandle, QueueError> {
        (**self).enqueue(kind, data, opts).await
    }
}

#[async_trait]
impl<T: JobSource + ?Sized> JobSource for Arc<T> {
    async fn claim_next(&self, kind: JobKind) -> Result<Option<Job>, QueueError> {
        (**self).claim_next(kind).await
    }

    fn lease(&self) -> Duration {
        (**self).lease()
    }

    async fn extend_lease(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError> {
        (**self).extend_lease(kind, id).await
    }

    async fn complete(
        &self,
        kind: JobKind,
        id: &JobId,
        return_value: Option<serde_json::Value>,
    ) -> Result<(), QueueError> {
        (**self).complete(kind, id, return_value).await
    }

    async fn fail(
        &self,
        kind: JobKind,
        id: &JobId,
        reason: &str,
    ) -> Result<FailOutcome, QueueError> {
        (**self).fail(kind, id, reason).await
    }

    async fn get(&self, kind: JobKind, id: &JobId) -> Result<Option<Job>, QueueError> {
        (**self).get(kind, id).await
    }

    async fn counts(&self, kind: JobKind) -> Result<JobCounts, QueueError> {
        (**self).counts(kind).await
    }

    async fn failed(&self, kind: JobKind, limit: usize) -> Result<Vec<Job>, QueueError> {
        (**self).failed(kind, limit).await
    }

    async fn retry_failed(&self, kind: JobKind, id: &JobId) -> Result<Job, QueueError> {
        (**self).retry_failed(kind, id).await
    }
}

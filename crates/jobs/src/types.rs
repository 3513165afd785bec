//! Core job types and policies.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasknator_core::DomainError;

use crate::data::JobData;
use crate::queue::QueueError;

/// Job kind; each kind has its own queue, payload shape and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Run an AI business audit.
    Audit,
    /// Generate a repair plan from a finished audit.
    Plan,
    /// Generate a marketing/operations asset for a plan.
    Asset,
    /// Produce a downloadable export bundle for a plan.
    Export,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [JobKind::Audit, JobKind::Plan, JobKind::Asset, JobKind::Export];

    /// Name of the queue this kind is routed to.
    pub fn queue_name(&self) -> &'static str {
        match self {
            JobKind::Audit => "audit",
            JobKind::Plan => "plan",
            JobKind::Asset => "asset",
            JobKind::Export => "export",
        }
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.queue_name())
    }
}

impl core::str::FromStr for JobKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|k| k.queue_name() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown job kind `{s}` (expected one of: audit, plan, asset, export)"
                ))
            })
    }
}

/// Identifier assigned by the queue when a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backoff applied between attempts.
///
/// Wire form: `{ "type": "exponential", "delay": <ms> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// `delay * 2^(attempt - 1)` milliseconds.
    Exponential { delay: u64 },
}

impl Backoff {
    pub const fn exponential(delay_ms: u64) -> Self {
        Self::Exponential { delay: delay_ms }
    }

    /// Delay before redelivery after failed attempt number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match *self {
            Backoff::Exponential { delay } => {
                let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
                Duration::from_millis(delay.saturating_mul(factor))
            }
        }
    }
}

/// Options attached to a job at enqueue time.
///
/// Wire form: `{ "attempts": n, "backoff"?: { ... } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Total attempts allowed, including the first one.
    pub attempts: u32,
    /// Without a backoff a failed job is retried immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
}

impl JobOptions {
    pub const fn new(attempts: u32, backoff: Option<Backoff>) -> Self {
        Self { attempts, backoff }
    }

    /// Delay before redelivery after failed attempt number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff
            .map(|b| b.delay_for_attempt(attempt))
            .unwrap_or(Duration::ZERO)
    }

    /// Whether a job that has failed `attempts_made` times may run again.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.attempts
    }
}

/// Where a job currently sits in its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Ready to be claimed.
    Waiting,
    /// Failed, waiting out its backoff before becoming ready again.
    Delayed,
    /// Claimed by a worker.
    Active,
    /// Finished successfully.
    Completed,
    /// Exhausted its attempts; kept for operator inspection.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Delayed => "delayed",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl core::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(JobStatus::Waiting),
            "delayed" => Ok(JobStatus::Delayed),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::validation(format!("unknown job status `{other}`"))),
        }
    }
}

/// Failure reason recorded when a claim's lease ran out before the worker
/// settled the job (worker crash, lost broker connection).
pub const LEASE_EXPIRED_REASON: &str = "lease expired before the job was settled";

/// Handle returned once the queue has accepted a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub job_id: JobId,
    pub queue: JobKind,
}

/// A job as stored by the queue.
///
/// The payload is immutable: retries redeliver `data` exactly as enqueued.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub data: serde_json::Value,
    pub opts: JobOptions,
    pub status: JobStatus,
    /// Failed attempts so far.
    pub attempts_made: u32,
    pub created_at: DateTime<Utc>,
    /// When the job was last claimed.
    pub processed_at: Option<DateTime<Utc>>,
    /// When a delayed job becomes ready again.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_reason: Option<String>,
    /// Value reported by the handler on success.
    pub return_value: Option<serde_json::Value>,
}

impl Job {
    pub fn new(id: JobId, kind: JobKind, data: serde_json::Value, opts: JobOptions) -> Self {
        Self {
            id,
            kind,
            data,
            opts,
            status: JobStatus::Waiting,
            attempts_made: 0,
            created_at: Utc::now(),
            processed_at: None,
            scheduled_at: None,
            finished_at: None,
            failed_reason: None,
            return_value: None,
        }
    }

    /// Attempt number of the current (or next) run, counted from 1.
    pub fn attempt(&self) -> u32 {
        self.attempts_made + 1
    }

    /// Decode the payload into its typed contract.
    pub fn data<D: JobData>(&self) -> Result<D, QueueError> {
        if self.kind != D::KIND {
            return Err(QueueError::KindMismatch {
                expected: D::KIND,
                actual: self.kind,
            });
        }
        serde_json::from_value(self.data.clone())
            .map_err(|e| QueueError::Deserialization(e.to_string()))
    }

    /// Decide what happens after the current attempt failed.
    pub fn next_after_failure(&self) -> FailOutcome {
        let attempt = self.attempt();
        if self.opts.should_retry(attempt) {
            FailOutcome::Retrying {
                attempt,
                delay: self.opts.delay_for_attempt(attempt),
            }
        } else {
            FailOutcome::Dead { attempts: attempt }
        }
    }

    /// Decide what happens to an active job whose lease expired.
    ///
    /// The abandoned run counts as an attempt, but a stalled job goes straight
    /// back to waiting: backoff is for handler failures, not lost workers.
    pub fn next_after_stall(&self) -> FailOutcome {
        let attempt = self.attempt();
        if self.opts.should_retry(attempt) {
            FailOutcome::Retrying {
                attempt,
                delay: Duration::ZERO,
            }
        } else {
            FailOutcome::Dead { attempts: attempt }
        }
    }
}

/// Result of reporting a failed attempt to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// The job will be redelivered after `delay` (zero = immediately).
    Retrying { attempt: u32, delay: Duration },
    /// The attempt budget is exhausted; the job is now `failed`.
    Dead { attempts: u32 },
}

/// Per-status job counts for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub waiting: u64,
    pub delayed: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_calculates_correctly() {
        let backoff = Backoff::exponential(5_000);

        assert_eq!(backoff.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(5_000));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(10_000));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(20_000));
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let backoff = Backoff::exponential(3_000);
        assert_eq!(backoff.delay_for_attempt(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn no_backoff_means_immediate_retry() {
        let opts = JobOptions::new(2, None);
        assert_eq!(opts.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn should_retry_respects_attempt_budget() {
        let opts = JobOptions::new(3, Some(Backoff::exponential(5_000)));

        assert!(opts.should_retry(1));
        assert!(opts.should_retry(2));
        assert!(!opts.should_retry(3));
        assert!(!opts.should_retry(4));
    }

    #[test]
    fn options_wire_format() {
        let with_backoff = JobOptions::new(3, Some(Backoff::exponential(5_000)));
        assert_eq!(
            serde_json::to_value(with_backoff).unwrap(),
            serde_json::json!({"attempts": 3, "backoff": {"type": "exponential", "delay": 5000}})
        );

        let without = JobOptions::new(2, None);
        assert_eq!(
            serde_json::to_value(without).unwrap(),
            serde_json::json!({"attempts": 2})
        );
    }

    #[test]
    fn failure_outcomes_follow_the_policy() {
        let mut job = Job::new(
            JobId::new("1"),
            JobKind::Audit,
            serde_json::json!({}),
            JobOptions::new(3, Some(Backoff::exponential(5_000))),
        );

        assert_eq!(
            job.next_after_failure(),
            FailOutcome::Retrying {
                attempt: 1,
                delay: Duration::from_millis(5_000)
            }
        );

        job.attempts_made = 1;
        assert_eq!(
            job.next_after_failure(),
            FailOutcome::Retrying {
                attempt: 2,
                delay: Duration::from_millis(10_000)
            }
        );

        job.attempts_made = 2;
        assert_eq!(job.next_after_failure(), FailOutcome::Dead { attempts: 3 });
    }

    #[test]
    fn stalled_jobs_retry_without_backoff() {
        let mut job = Job::new(
            JobId::new("1"),
            JobKind::Asset,
            serde_json::json!({}),
            JobOptions::new(2, Some(Backoff::exponential(3_000))),
        );

        assert_eq!(
            job.next_after_stall(),
            FailOutcome::Retrying {
                attempt: 1,
                delay: Duration::ZERO
            }
        );

        job.attempts_made = 1;
        assert_eq!(job.next_after_stall(), FailOutcome::Dead { attempts: 2 });
    }

    #[test]
    fn kind_round_trips_through_queue_name() {
        for kind in JobKind::ALL {
            assert_eq!(kind.queue_name().parse::<JobKind>().unwrap(), kind);
        }
        assert!("reports".parse::<JobKind>().is_err());
    }
}

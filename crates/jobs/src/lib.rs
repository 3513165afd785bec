//! Background job pipeline: contracts, queue capability, producers, workers.
//!
//! ## Design
//!
//! - One queue per job kind (`audit`, `plan`, `asset`, `export`)
//! - Typed payloads, immutable once enqueued
//! - Fixed retry policy per kind, exponential backoff
//! - Dead jobs stay in the `failed` state for operator inspection/re-drive
//! - Claims are leased; a job whose worker vanished is redelivered
//!
//! ## Components
//!
//! - `data`: job data contracts shared by producers and workers
//! - `QueueClient` / `JobSource`: producer and worker sides of a broker
//! - `producers`: `enqueue_audit`, `enqueue_plan`, `enqueue_asset`, `enqueue_export`
//! - `InMemoryQueue`: broker semantics without a broker (tests/dev)
//! - `JobWorker`: claims and settles jobs for one queue

pub mod data;
pub mod memory;
pub mod producers;
pub mod queue;
pub mod types;
pub mod worker;

pub use data::{AssetJobData, AuditJobData, ExportFormat, ExportJobData, JobData, PlanJobData};
pub use memory::InMemoryQueue;
pub use producers::{enqueue_asset, enqueue_audit, enqueue_export, enqueue_plan, policy_for};
pub use queue::{
    DEFAULT_COMPLETED_RETENTION, DEFAULT_LEASE, JobQueue, JobSource, QueueClient, QueueError,
};
pub use types::{
    Backoff, FailOutcome, Job, JobCounts, JobHandle, JobId, JobKind, JobOptions, JobStatus,
    LEASE_EXPIRED_REASON,
};
pub use worker::{HandlerResult, JobHandler, JobRun, JobWorker, JobWorkerConfig, JobWorkerHandle, WorkerStats};

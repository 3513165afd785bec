//! Job producers: one per kind.
//!
//! A producer attaches the kind's fixed retry policy and hands the payload to
//! the queue untouched. Producers do not deduplicate: two calls enqueue two
//! independent jobs, so at-most-once semantics are the caller's concern.

use tracing::{debug, instrument};

use crate::data::{AssetJobData, AuditJobData, ExportJobData, JobData, PlanJobData};
use crate::queue::{QueueClient, QueueError};
use crate::types::{Backoff, JobHandle, JobKind, JobOptions};

/// Audit: 3 attempts, exponential backoff from 5s.
pub const AUDIT_POLICY: JobOptions = JobOptions::new(3, Some(Backoff::exponential(5_000)));
/// Plan: 3 attempts, exponential backoff from 5s.
pub const PLAN_POLICY: JobOptions = JobOptions::new(3, Some(Backoff::exponential(5_000)));
/// Asset: 2 attempts, exponential backoff from 3s.
pub const ASSET_POLICY: JobOptions = JobOptions::new(2, Some(Backoff::exponential(3_000)));
/// Export: 2 attempts, retried immediately.
pub const EXPORT_POLICY: JobOptions = JobOptions::new(2, None);

/// Fixed retry policy for a job kind.
pub fn policy_for(kind: JobKind) -> JobOptions {
    match kind {
        JobKind::Audit => AUDIT_POLICY,
        JobKind::Plan => PLAN_POLICY,
        JobKind::Asset => ASSET_POLICY,
        JobKind::Export => EXPORT_POLICY,
    }
}

pub async fn enqueue_audit<Q>(queue: &Q, data: AuditJobData) -> Result<JobHandle, QueueError>
where
    Q: QueueClient + ?Sized,
{
    enqueue_job(queue, &data).await
}

pub async fn enqueue_plan<Q>(queue: &Q, data: PlanJobData) -> Result<JobHandle, QueueError>
where
    Q: QueueClient + ?Sized,
{
    enqueue_job(queue, &data).await
}

pub async fn enqueue_asset<Q>(queue: &Q, data: AssetJobData) -> Result<JobHandle, QueueError>
where
    Q: QueueClient + ?Sized,
{
    enqueue_job(queue, &data).await
}

pub async fn enqueue_export<Q>(queue: &Q, data: ExportJobData) -> Result<JobHandle, QueueError>
where
    Q: QueueClient + ?Sized,
{
    enqueue_job(queue, &data).await
}

#[instrument(skip_all, fields(queue = %D::KIND, workspace_id = %data.workspace_id()), err)]
async fn enqueue_job<Q, D>(queue: &Q, data: &D) -> Result<JobHandle, QueueError>
where
    Q: QueueClient + ?Sized,
    D: JobData,
{
    let payload =
        serde_json::to_value(data).map_err(|e| QueueError::Serialization(e.to_string()))?;

    let handle = queue.enqueue(D::KIND, payload, policy_for(D::KIND)).await?;

    debug!(job_id = %handle.job_id, "job enqueued");
    Ok(handle)
}

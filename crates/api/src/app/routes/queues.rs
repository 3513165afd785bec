//! Operator endpoints: per-queue counts, dead jobs, manual re-drive.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    response::IntoResponse,
};

use tasknator_jobs::{JobId, JobQueue, JobSource};

use crate::app::dto::{FailedJobsQuery, FailedJobsResponse, QueueStatsResponse};
use crate::app::errors;

pub async fn stats(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    Path(kind): Path<String>,
) -> axum::response::Response {
    let kind = match errors::parse_queue(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match queue.counts(kind).await {
        Ok(counts) => Json(QueueStatsResponse {
            queue: kind,
            counts,
        })
        .into_response(),
        Err(e) => errors::queue_error_to_response(e),
    }
}

pub async fn failed(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    Path(kind): Path<String>,
    Query(query): Query<FailedJobsQuery>,
) -> axum::response::Response {
    let kind = match errors::parse_queue(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match queue.failed(kind, query.limit()).await {
        Ok(jobs) => Json(FailedJobsResponse { queue: kind, jobs }).into_response(),
        Err(e) => errors::queue_error_to_response(e),
    }
}

pub async fn retry(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    Path((kind, job_id)): Path<(String, String)>,
) -> axum::response::Response {
    let kind = match errors::parse_queue(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match queue.retry_failed(kind, &JobId::new(job_id)).await {
        Ok(job) => {
            tracing::info!(queue = %kind, job_id = %job.id, "dead job re-driven by operator");
            Json(job).into_response()
        }
        Err(e) => errors::queue_error_to_response(e),
    }
}

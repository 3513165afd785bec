//! Enqueue endpoints. The caller has already persisted the record the job
//! refers to; these only hand the job to the broker.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use tasknator_jobs::{
    AssetJobData, AuditJobData, ExportJobData, JobHandle, JobQueue, PlanJobData, QueueError,
    producers,
};

use crate::app::errors;

type Payload<T> = Result<Json<T>, JsonRejection>;

pub async fn enqueue_audit(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    body: Payload<AuditJobData>,
) -> axum::response::Response {
    match body {
        Ok(Json(data)) => accepted(producers::enqueue_audit(queue.as_ref(), data).await),
        Err(rejection) => invalid_payload(rejection),
    }
}

pub async fn enqueue_plan(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    body: Payload<PlanJobData>,
) -> axum::response::Response {
    match body {
        Ok(Json(data)) => accepted(producers::enqueue_plan(queue.as_ref(), data).await),
        Err(rejection) => invalid_payload(rejection),
    }
}

pub async fn enqueue_asset(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    body: Payload<AssetJobData>,
) -> axum::response::Response {
    match body {
        Ok(Json(data)) => accepted(producers::enqueue_asset(queue.as_ref(), data).await),
        Err(rejection) => invalid_payload(rejection),
    }
}

/// Formats the worker cannot render are refused with 422 instead of being
/// queued only to exhaust their attempts.
pub async fn enqueue_export(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    body: Payload<ExportJobData>,
) -> axum::response::Response {
    match body {
        Ok(Json(data)) if !data.format.is_renderable() => errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "unsupported_format",
            format!("export format `{}` is not supported", data.format),
        ),
        Ok(Json(data)) => accepted(producers::enqueue_export(queue.as_ref(), data).await),
        Err(rejection) => invalid_payload(rejection),
    }
}

fn accepted(result: Result<JobHandle, QueueError>) -> axum::response::Response {
    match result {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::queue_error_to_response(e),
    }
}

fn invalid_payload(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(rejection.status(), "invalid_payload", rejection.body_text())
}

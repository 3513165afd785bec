use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tasknator_jobs::{JobKind, QueueError};

pub fn queue_error_to_response(err: QueueError) -> axum::response::Response {
    if err.is_transient() {
        tracing::warn!(error = %err, "broker unavailable");
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "broker_unavailable",
            err.to_string(),
        );
    }

    match err {
        QueueError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "job_not_found", err.to_string()),
        QueueError::InvalidState { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_job_state", err.to_string())
        }
        QueueError::KindMismatch { .. } => {
            json_error(StatusCode::BAD_REQUEST, "kind_mismatch", err.to_string())
        }
        other => {
            tracing::error!(error = %other, "queue error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "queue_error", other.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_queue(s: &str) -> Result<JobKind, axum::response::Response> {
    s.parse::<JobKind>().map_err(|_| {
        json_error(
            StatusCode::NOT_FOUND,
            "unknown_queue",
            "queue must be one of: audit, plan, asset, export",
        )
    })
}

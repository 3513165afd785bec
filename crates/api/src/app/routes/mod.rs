use axum::{
    Router,
    routing::{get, post},
};

pub mod jobs;
pub mod queues;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/jobs/audit", post(jobs::enqueue_audit))
        .route("/jobs/plan", post(jobs::enqueue_plan))
        .route("/jobs/asset", post(jobs::enqueue_asset))
        .route("/jobs/export", post(jobs::enqueue_export))
        .route("/queues/:kind", get(queues::stats))
        .route("/queues/:kind/failed", get(queues::failed))
        .route("/queues/:kind/failed/:job_id/retry", post(queues::retry))
}

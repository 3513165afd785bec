//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response shapes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use tasknator_jobs::JobQueue;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `queue` is the process-wide broker handle; `api_token` is the shared
/// service token every route except `/health` requires.
pub fn build_app(queue: Arc<dyn JobQueue>, api_token: impl Into<String>) -> Router {
    let auth_state = middleware::AuthState::new(api_token);

    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(queue)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}

//! Internal jobs HTTP API: enqueue endpoints for the application and queue
//! inspection/re-drive endpoints for operators.

pub mod app;
pub mod middleware;

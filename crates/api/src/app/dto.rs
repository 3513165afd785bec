use serde::{Deserialize, Serialize};

use tasknator_jobs::{Job, JobCounts, JobKind};

/// Default and upper bound for `GET /queues/:kind/failed?limit=`.
pub const DEFAULT_FAILED_LIMIT: usize = 50;
pub const MAX_FAILED_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct FailedJobsQuery {
    pub limit: Option<usize>,
}

impl FailedJobsQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_FAILED_LIMIT)
            .min(MAX_FAILED_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct QueueStatsResponse {
    pub queue: JobKind,
    pub counts: JobCounts,
}

#[derive(Debug, Serialize)]
pub struct FailedJobsResponse {
    pub queue: JobKind,
    pub jobs: Vec<Job>,
}

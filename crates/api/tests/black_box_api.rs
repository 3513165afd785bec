use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use tasknator_jobs::{
    FailOutcome, InMemoryQueue, Job, JobCounts, JobHandle, JobId, JobKind, JobOptions, JobQueue,
    JobSource, JobStatus, QueueClient, QueueError,
};

const TOKEN: &str = "test-token";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(queue: Arc<dyn JobQueue>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = tasknator_api::app::build_app(queue, TOKEN);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A broker that refuses every command.
struct DownBroker;

fn down() -> QueueError {
    QueueError::Connection("connection refused".to_string())
}

#[async_trait]
impl QueueClient for DownBroker {
    async fn enqueue(&self, _: JobKind, _: Value, _: JobOptions) -> Result<JobHandle, QueueError> {
        Err(down())
    }
}

#[async_trait]
impl JobSource for DownBroker {
    async fn claim_next(&self, _: JobKind) -> Result<Option<Job>, QueueError> {
        Err(down())
    }
    fn lease(&self) -> std::time::Duration {
        tasknator_jobs::DEFAULT_LEASE
    }
    async fn extend_lease(&self, _: JobKind, _: &JobId) -> Result<(), QueueError> {
        Err(down())
    }
    async fn complete(&self, _: JobKind, _: &JobId, _: Option<Value>) -> Result<(), QueueError> {
        Err(down())
    }
    async fn fail(&self, _: JobKind, _: &JobId, _: &str) -> Result<FailOutcome, QueueError> {
        Err(down())
    }
    async fn get(&self, _: JobKind, _: &JobId) -> Result<Option<Job>, QueueError> {
        Err(down())
    }
    async fn counts(&self, _: JobKind) -> Result<JobCounts, QueueError> {
        Err(down())
    }
    async fn failed(&self, _: JobKind, _: usize) -> Result<Vec<Job>, QueueError> {
        Err(down())
    }
    async fn retry_failed(&self, _: JobKind, _: &JobId) -> Result<Job, QueueError> {
        Err(down())
    }
}

fn audit_body() -> Value {
    json!({
        "auditRunId": "run-1",
        "businessProfileId": "bp-1",
        "workspaceId": "ws-1"
    })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(Arc::new(InMemoryQueue::new())).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_required_for_job_endpoints() {
    let srv = TestServer::spawn(Arc::new(InMemoryQueue::new())).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/audit"))
        .json(&audit_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/queues/audit"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn enqueue_returns_handle_and_job_is_waiting() {
    let queue = Arc::new(InMemoryQueue::new());
    let srv = TestServer::spawn(queue.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/audit"))
        .bearer_auth(TOKEN)
        .json(&audit_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["queue"], "audit");
    let job_id = JobId::new(body["jobId"].as_str().unwrap());

    let job = queue.get(JobKind::Audit, &job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Waiting);
    assert_eq!(job.data, audit_body());
    assert_eq!(job.opts.attempts, 3);
}

#[tokio::test]
async fn each_kind_routes_to_its_queue() {
    let queue = Arc::new(InMemoryQueue::new());
    let srv = TestServer::spawn(queue.clone()).await;
    let client = reqwest::Client::new();

    let cases = [
        ("/jobs/plan", audit_body(), "plan"),
        (
            "/jobs/asset",
            json!({
                "repairPlanId": "plan-1",
                "assetType": "AD_COPY",
                "businessProfileId": "bp-1",
                "workspaceId": "ws-1"
            }),
            "asset",
        ),
        (
            "/jobs/export",
            json!({ "repairPlanId": "plan-1", "format": "zip", "workspaceId": "ws-1" }),
            "export",
        ),
    ];

    for (path, body, queue_name) in cases {
        let res = client
            .post(srv.url(path))
            .bearer_auth(TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED, "{path}");
        let handle: Value = res.json().await.unwrap();
        assert_eq!(handle["queue"], queue_name);
    }

    for kind in [JobKind::Plan, JobKind::Asset, JobKind::Export] {
        assert_eq!(queue.counts(kind).await.unwrap().waiting, 1);
    }
    assert_eq!(queue.counts(JobKind::Audit).await.unwrap().waiting, 0);
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_enqueue() {
    let queue = Arc::new(InMemoryQueue::new());
    let srv = TestServer::spawn(queue.clone()).await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "auditRunId": "run-1", "workspaceId": "ws-1" }),
        json!({ "auditRunId": "", "businessProfileId": "bp-1", "workspaceId": "ws-1" }),
    ] {
        let res = client
            .post(srv.url("/jobs/audit"))
            .bearer_auth(TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert!(res.status().is_client_error());
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_payload");
    }

    assert_eq!(queue.counts(JobKind::Audit).await.unwrap(), JobCounts::default());
}

#[tokio::test]
async fn unrenderable_export_format_is_422() {
    let queue = Arc::new(InMemoryQueue::new());
    let srv = TestServer::spawn(queue.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/export"))
        .bearer_auth(TOKEN)
        .json(&json!({ "repairPlanId": "plan-1", "format": "pdf", "workspaceId": "ws-1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unsupported_format");
    assert_eq!(queue.counts(JobKind::Export).await.unwrap(), JobCounts::default());
}

#[tokio::test]
async fn broker_failure_is_503() {
    let srv = TestServer::spawn(Arc::new(DownBroker)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/audit"))
        .bearer_auth(TOKEN)
        .json(&audit_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "broker_unavailable");
}

#[tokio::test]
async fn operator_can_list_and_redrive_dead_jobs() {
    let queue = Arc::new(InMemoryQueue::new());
    let srv = TestServer::spawn(queue.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/export"))
        .bearer_auth(TOKEN)
        .json(&json!({ "repairPlanId": "plan-1", "format": "zip", "workspaceId": "ws-1" }))
        .send()
        .await
        .unwrap();
    let handle: Value = res.json().await.unwrap();
    let job_id = handle["jobId"].as_str().unwrap().to_string();

    // Export allows two attempts with no backoff.
    for reason in ["storage down", "storage still down"] {
        let job = queue.claim_next(JobKind::Export).await.unwrap().unwrap();
        queue.fail(JobKind::Export, &job.id, reason).await.unwrap();
    }

    let stats: Value = client
        .get(srv.url("/queues/export"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["queue"], "export");
    assert_eq!(stats["counts"]["failed"], 1);

    let dead: Value = client
        .get(srv.url("/queues/export/failed?limit=10"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dead["jobs"][0]["id"], job_id.as_str());
    assert_eq!(dead["jobs"][0]["failedReason"], "storage still down");
    assert_eq!(dead["jobs"][0]["attemptsMade"], 2);

    let res = client
        .post(srv.url(&format!("/queues/export/failed/{job_id}/retry")))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let job: Value = res.json().await.unwrap();
    assert_eq!(job["status"], "waiting");
    assert_eq!(job["attemptsMade"], 0);

    // Already waiting: a second re-drive conflicts.
    let res = client
        .post(srv.url(&format!("/queues/export/failed/{job_id}/retry")))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_queue_and_job_are_404() {
    let srv = TestServer::spawn(Arc::new(InMemoryQueue::new())).await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/queues/billing"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/queues/audit/failed/999/retry"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "job_not_found");
}

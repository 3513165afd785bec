//! Job worker with retry and dead-letter reporting.
//!
//! A worker serves one queue: it claims a job, runs the registered handler and
//! settles the job. Retry scheduling belongs to the queue (`JobSource::fail`);
//! the worker only reports what happened.
//!
//! While a handler runs the worker renews the claim's lease at half its
//! length. If the worker dies, or cannot settle the job, the lease runs out
//! and the queue hands the job to the next claim.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::queue::{JobSource, QueueError};
use crate::types::{FailOutcome, Job, JobId, JobKind};

/// Handler outcome: an optional value recorded on the completed job.
pub type HandlerResult = anyhow::Result<Option<serde_json::Value>>;

/// Processes jobs of one kind.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> HandlerResult;
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// How long to sleep when the queue is empty
    pub poll_interval: Duration,
    /// Name for logging
    pub name: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            name: "job-worker".to_string(),
        }
    }
}

impl JobWorkerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// What happened to a processed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRun {
    Completed { id: JobId },
    Retrying { id: JobId, attempt: u32, delay: Duration },
    Dead { id: JobId, attempts: u32 },
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct WorkerStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_dead_lettered: u64,
    pub uptime_secs: u64,
}

#[derive(Debug)]
struct StatsCounters {
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    dead_lettered: AtomicU64,
    started: Instant,
}

impl StatsCounters {
    fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    fn record(&self, run: &JobRun) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        match run {
            JobRun::Completed { .. } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            JobRun::Retrying { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            JobRun::Dead { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.dead_lettered.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            jobs_processed: self.processed.load(Ordering::Relaxed),
            jobs_succeeded: self.succeeded.load(Ordering::Relaxed),
            jobs_failed: self.failed.load(Ordering::Relaxed),
            jobs_dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct JobWorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
    stats: Arc<StatsCounters>,
}

impl JobWorkerHandle {
    /// Request graceful shutdown; the job in flight (if any) is finished first.
    ///
    /// Returns the final statistics.
    pub async fn shutdown(self) -> WorkerStats {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "job worker task ended abnormally");
        }
        self.stats.snapshot()
    }

    /// Get current worker statistics.
    pub fn stats(&self) -> WorkerStats {
        self.stats.snapshot()
    }
}

/// Background job worker for a single queue.
pub struct JobWorker<S: ?Sized> {
    source: Arc<S>,
    kind: JobKind,
    handler: Arc<dyn JobHandler>,
    config: JobWorkerConfig,
    stats: Arc<StatsCounters>,
}

impl<S> JobWorker<S>
where
    S: JobSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, kind: JobKind, handler: Arc<dyn JobHandler>) -> Self {
        Self {
            source,
            kind,
            handler,
            config: JobWorkerConfig::default(),
            stats: Arc::new(StatsCounters::new()),
        }
    }

    pub fn with_config(mut self, config: JobWorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.snapshot()
    }

    /// Claim and process a single job, if one is ready.
    pub async fn run_once(&self) -> Result<Option<JobRun>, QueueError> {
        let Some(job) = self.source.claim_next(self.kind).await? else {
            return Ok(None);
        };

        let span = info_span!(
            "job",
            worker = %self.config.name,
            queue = %self.kind,
            job_id = %job.id,
            attempt = job.attempt()
        );
        let run = self.process(job).instrument(span).await?;
        self.stats.record(&run);
        Ok(Some(run))
    }

    /// Run the handler, renewing the job's lease until it returns.
    async fn handle_leased(&self, job: &Job) -> HandlerResult {
        let period = (self.source.lease() / 2).max(Duration::from_millis(1));
        let mut renew = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        renew.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut handling = self.handler.handle(job);
        loop {
            tokio::select! {
                result = &mut handling => return result,
                _ = renew.tick() => {
                    if let Err(e) = self.source.extend_lease(self.kind, &job.id).await {
                        warn!(error = %e, "failed to renew job lease");
                    }
                }
            }
        }
    }

    async fn process(&self, job: Job) -> Result<JobRun, QueueError> {
        let started = Instant::now();
        let result = self.handle_leased(&job).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(return_value) => {
                self.source.complete(self.kind, &job.id, return_value).await?;
                debug!(elapsed_ms, "job completed");
                Ok(JobRun::Completed { id: job.id })
            }
            Err(e) => {
                let reason = format!("{e:#}");
                match self.source.fail(self.kind, &job.id, &reason).await? {
                    FailOutcome::Retrying { attempt, delay } => {
                        warn!(
                            elapsed_ms,
                            error = %reason,
                            retry_in_ms = delay.as_millis() as u64,
                            "job failed, will retry"
                        );
                        Ok(JobRun::Retrying {
                            id: job.id,
                            attempt,
                            delay,
                        })
                    }
                    FailOutcome::Dead { attempts } => {
                        error!(
                            elapsed_ms,
                            error = %reason,
                            attempts,
                            "job exhausted its attempts and was moved to failed"
                        );
                        Ok(JobRun::Dead {
                            id: job.id,
                            attempts,
                        })
                    }
                }
            }
        }
    }

    /// Spawn the worker loop on the tokio runtime.
    pub fn spawn(self) -> JobWorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let join = tokio::spawn(self.run_loop(shutdown_rx));

        JobWorkerHandle {
            shutdown: shutdown_tx,
            join,
            stats,
        }
    }

    async fn run_loop(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = %self.config.name, queue = %self.kind, "job worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_once().await {
                // Drain the queue before sleeping.
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    error!(worker = %self.config.name, queue = %self.kind, error = %e, "failed to process job");
                }
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker = %self.config.name, queue = %self.kind, "job worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use serde_json::json;

    use super::*;
    use crate::memory::InMemoryQueue;
    use crate::producers::{AUDIT_POLICY, EXPORT_POLICY};
    use crate::queue::QueueClient;
    use crate::types::{JobCounts, JobOptions, JobStatus, LEASE_EXPIRED_REASON};

    struct Succeeds;

    #[async_trait]
    impl JobHandler for Succeeds {
        async fn handle(&self, job: &Job) -> HandlerResult {
            Ok(Some(json!({"echo": job.data.clone()})))
        }
    }

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl JobHandler for Flaky {
        async fn handle(&self, _job: &Job) -> HandlerResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                anyhow::bail!("transient failure #{}", call + 1);
            }
            Ok(None)
        }
    }

    /// Sleeps before succeeding.
    struct Slow(Duration);

    #[async_trait]
    impl JobHandler for Slow {
        async fn handle(&self, _job: &Job) -> HandlerResult {
            tokio::time::sleep(self.0).await;
            Ok(None)
        }
    }

    /// Queue whose first `complete` is lost to a dropped broker connection.
    struct DropsFirstComplete {
        inner: InMemoryQueue,
        dropped: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl JobSource for DropsFirstComplete {
        async fn claim_next(&self, kind: JobKind) -> Result<Option<Job>, QueueError> {
            self.inner.claim_next(kind).await
        }

        fn lease(&self) -> Duration {
            self.inner.lease()
        }

        async fn extend_lease(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError> {
            self.inner.extend_lease(kind, id).await
        }

        async fn complete(
            &self,
            kind: JobKind,
            id: &JobId,
            return_value: Option<serde_json::Value>,
        ) -> Result<(), QueueError> {
            if !self.dropped.swap(true, Ordering::SeqCst) {
                return Err(QueueError::Connection("connection dropped".to_string()));
            }
            self.inner.complete(kind, id, return_value).await
        }

        async fn fail(
            &self,
            kind: JobKind,
            id: &JobId,
            reason: &str,
        ) -> Result<FailOutcome, QueueError> {
            self.inner.fail(kind, id, reason).await
        }

        async fn get(&self, kind: JobKind, id: &JobId) -> Result<Option<Job>, QueueError> {
            self.inner.get(kind, id).await
        }

        async fn counts(&self, kind: JobKind) -> Result<JobCounts, QueueError> {
            self.inner.counts(kind).await
        }

        async fn failed(&self, kind: JobKind, limit: usize) -> Result<Vec<Job>, QueueError> {
            self.inner.failed(kind, limit).await
        }

        async fn retry_failed(&self, kind: JobKind, id: &JobId) -> Result<Job, QueueError> {
            self.inner.retry_failed(kind, id).await
        }
    }

    #[tokio::test]
    async fn run_once_on_empty_queue() {
        let queue = Arc::new(InMemoryQueue::new());
        let worker = JobWorker::new(queue, JobKind::Audit, Arc::new(Succeeds));

        assert_eq!(worker.run_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn successful_job_is_completed() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue
            .enqueue(JobKind::Audit, json!({"auditRunId": "run_1"}), AUDIT_POLICY)
            .await
            .unwrap()
            .job_id;
        let worker = JobWorker::new(queue.clone(), JobKind::Audit, Arc::new(Succeeds));

        let run = worker.run_once().await.unwrap().unwrap();
        assert_eq!(run, JobRun::Completed { id: id.clone() });

        let job = queue.get(JobKind::Audit, &id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(
            job.return_value,
            Some(json!({"echo": {"auditRunId": "run_1"}}))
        );
        assert_eq!(worker.stats().jobs_succeeded, 1);
    }

    #[tokio::test]
    async fn failing_job_retries_then_dead_letters() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue
            .enqueue(JobKind::Export, json!({}), EXPORT_POLICY)
            .await
            .unwrap()
            .job_id;
        let handler = Arc::new(Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let worker = JobWorker::new(queue.clone(), JobKind::Export, handler);

        let first = worker.run_once().await.unwrap().unwrap();
        assert_eq!(
            first,
            JobRun::Retrying {
                id: id.clone(),
                attempt: 1,
                delay: Duration::ZERO
            }
        );

        let second = worker.run_once().await.unwrap().unwrap();
        assert_eq!(
            second,
            JobRun::Dead {
                id: id.clone(),
                attempts: 2
            }
        );

        let dead = queue.failed(JobKind::Export, 10).await.unwrap();
        assert_eq!(dead[0].failed_reason.as_deref(), Some("transient failure #2"));

        let stats = worker.stats();
        assert_eq!(stats.jobs_processed, 2);
        assert_eq!(stats.jobs_failed, 2);
        assert_eq!(stats.jobs_dead_lettered, 1);
    }

    #[tokio::test]
    async fn spawned_worker_drains_queue_and_shuts_down() {
        let queue = Arc::new(InMemoryQueue::new());
        for i in 0..3 {
            queue
                .enqueue(JobKind::Export, json!({"i": i}), EXPORT_POLICY)
                .await
                .unwrap();
        }
        let handler = Arc::new(Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
        });
        let config = JobWorkerConfig::default()
            .with_name("test-worker")
            .with_poll_interval(Duration::from_millis(5));
        let handle = JobWorker::new(queue.clone(), JobKind::Export, handler)
            .with_config(config)
            .spawn();

        for _ in 0..200 {
            if queue.counts(JobKind::Export).await.unwrap().completed == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(handle.stats().jobs_failed, 1);
        let stats = handle.shutdown().await;

        let counts = queue.counts(JobKind::Export).await.unwrap();
        assert_eq!(counts.completed, 3);
        assert_eq!(counts.failed, 0);
        assert_eq!(stats.jobs_succeeded, 3);
        assert_eq!(stats.jobs_failed, 1);
    }

    #[tokio::test]
    async fn unsettled_job_is_redelivered_after_its_lease() {
        let queue = Arc::new(DropsFirstComplete {
            inner: InMemoryQueue::new().with_lease(Duration::from_millis(20)),
            dropped: std::sync::atomic::AtomicBool::new(false),
        });
        let id = queue
            .inner
            .enqueue(JobKind::Audit, json!({"auditRunId": "run_1"}), AUDIT_POLICY)
            .await
            .unwrap()
            .job_id;
        let worker = JobWorker::new(queue.clone(), JobKind::Audit, Arc::new(Succeeds));

        let err = worker.run_once().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(worker.run_once().await.unwrap(), None);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let run = worker.run_once().await.unwrap().unwrap();
        assert_eq!(run, JobRun::Completed { id: id.clone() });

        let job = queue.get(JobKind::Audit, &id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts_made, 1);
        assert_eq!(job.failed_reason.as_deref(), Some(LEASE_EXPIRED_REASON));
        assert_eq!(
            queue.counts(JobKind::Audit).await.unwrap(),
            JobCounts {
                completed: 1,
                ..JobCounts::default()
            }
        );
    }

    #[tokio::test]
    async fn long_running_handler_keeps_its_lease() {
        let queue = Arc::new(InMemoryQueue::new().with_lease(Duration::from_millis(100)));
        let id = queue
            .enqueue(
                JobKind::Asset,
                json!({}),
                JobOptions::new(2, None),
            )
            .await
            .unwrap()
            .job_id;
        let worker = Arc::new(JobWorker::new(
            queue.clone(),
            JobKind::Asset,
            Arc::new(Slow(Duration::from_millis(300))),
        ));

        let running = tokio::spawn({
            let worker = worker.clone();
            async move { worker.run_once().await }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(queue.claim_next(JobKind::Asset).await.unwrap().is_none());

        let run = running.await.unwrap().unwrap().unwrap();
        assert_eq!(run, JobRun::Completed { id: id.clone() });
        let job = queue.get(JobKind::Asset, &id).await.unwrap().unwrap();
        assert_eq!(job.attempts_made, 0);
    }
}

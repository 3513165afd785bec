//! Redis-backed job queue (durable, at-least-once delivery).
//!
//! ## Layout (prefix `tasknator`)
//!
//! - `<p>:<queue>:id`: job id counter
//! - `<p>:<queue>:<id>`: job hash (`name`, `data`, `opts`, `state`,
//!   `attemptsMade`, `timestamp`, `processedOn`, `scheduledAt`, `finishedOn`,
//!   `failedReason`, `returnvalue`)
//! - `<p>:<queue>:wait`: ready jobs, LPUSH in / RPOP out
//! - `<p>:<queue>:active`: claimed jobs
//! - `<p>:<queue>:leases`: active jobs scored by lease deadline (ms)
//! - `<p>:<queue>:delayed`: backoff set, scored by ready-at (ms)
//! - `<p>:<queue>:completed`, `<p>:<queue>:failed`: scored by finish time (ms)
//!
//! Every state transition runs as one Lua script, so a job is always in
//! exactly one list or set. Timestamps are epoch milliseconds supplied by the
//! caller.
//!
//! Commands that hit a dropped connection are re-sent once the connection
//! manager has reconnected, without an attempt limit. A drop between the
//! broker running `enqueue` and its reply reaching us can therefore store a
//! job twice; delivery is at-least-once either way.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{RedisError, RedisResult, Script};
use tracing::{debug, info, instrument, warn};

use tasknator_jobs::{
    DEFAULT_COMPLETED_RETENTION, DEFAULT_LEASE, FailOutcome, Job, JobCounts, JobHandle, JobId,
    JobKind, JobOptions, JobSource, JobStatus, LEASE_EXPIRED_REASON, QueueClient, QueueError,
};

pub const DEFAULT_PREFIX: &str = "tasknator";

const ENQUEUE_SCRIPT: &str = r#"
local id = tostring(redis.call('INCR', KEYS[1]))
redis.call('HSET', ARGV[1] .. id,
  'name', ARGV[2], 'data', ARGV[3], 'opts', ARGV[4],
  'state', 'waiting', 'attemptsMade', 0, 'timestamp', ARGV[5])
redis.call('LPUSH', KEYS[2], id)
return id
"#;

// KEYS: wait, active, delayed, leases, failed.
// ARGV: job key prefix, now, lease deadline, stalled reason.
const CLAIM_SCRIPT: &str = r#"
local stalled = redis.call('ZRANGEBYSCORE', KEYS[4], '-inf', ARGV[2])
for _, id in ipairs(stalled) do
  redis.call('ZREM', KEYS[4], id)
  if redis.call('LREM', KEYS[2], 1, id) > 0 then
    local job = ARGV[1] .. id
    local made = redis.call('HINCRBY', job, 'attemptsMade', 1)
    local allowed = 1
    local opts = redis.call('HGET', job, 'opts')
    if opts then
      allowed = tonumber(cjson.decode(opts)['attempts']) or 1
    end
    redis.call('HSET', job, 'failedReason', ARGV[4])
    if made < allowed then
      redis.call('HSET', job, 'state', 'waiting')
      redis.call('LPUSH', KEYS[1], id)
    else
      redis.call('HSET', job, 'state', 'failed', 'finishedOn', ARGV[2])
      redis.call('ZADD', KEYS[5], ARGV[2], id)
    end
  end
end
local due = redis.call('ZRANGEBYSCORE', KEYS[3], '-inf', ARGV[2])
for _, id in ipairs(due) do
  redis.call('ZREM', KEYS[3], id)
  redis.call('HSET', ARGV[1] .. id, 'state', 'waiting')
  redis.call('HDEL', ARGV[1] .. id, 'scheduledAt')
  redis.call('LPUSH', KEYS[1], id)
end
local id = redis.call('RPOPLPUSH', KEYS[1], KEYS[2])
if not id then
  return false
end
redis.call('HSET', ARGV[1] .. id, 'state', 'active', 'processedOn', ARGV[2])
redis.call('ZADD', KEYS[4], ARGV[3], id)
return id
"#;

// KEYS: leases. ARGV: id, lease deadline.
const EXTEND_LEASE_SCRIPT: &str = r#"
if not redis.call('ZSCORE', KEYS[1], ARGV[1]) then
  return 0
end
redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
return 1
"#;

// KEYS: active, completed, job, leases.
// ARGV: id, now, return value ('' = none), job key prefix, completed retention.
const COMPLETE_SCRIPT: &str = r#"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) == 0 then
  return 0
end
redis.call('ZREM', KEYS[4], ARGV[1])
redis.call('HSET', KEYS[3], 'state', 'completed', 'finishedOn', ARGV[2])
if ARGV[3] == '' then
  redis.call('HDEL', KEYS[3], 'returnvalue')
else
  redis.call('HSET', KEYS[3], 'returnvalue', ARGV[3])
end
redis.call('ZADD', KEYS[2], ARGV[2], ARGV[1])
local excess = redis.call('ZCARD', KEYS[2]) - tonumber(ARGV[5])
if excess > 0 then
  local old = redis.call('ZRANGE', KEYS[2], 0, excess - 1)
  for _, oldId in ipairs(old) do
    redis.call('DEL', ARGV[4] .. oldId)
  end
  redis.call('ZREMRANGEBYRANK', KEYS[2], 0, excess - 1)
end
return 1
"#;

// KEYS: active, wait, delayed, failed, job, leases.
// ARGV: id, now, reason, mode (wait | delay | dead), ready-at.
const FAIL_SCRIPT: &str = r#"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) == 0 then
  return 0
end
redis.call('ZREM', KEYS[6], ARGV[1])
redis.call('HINCRBY', KEYS[5], 'attemptsMade', 1)
redis.call('HSET', KEYS[5], 'failedReason', ARGV[3])
if ARGV[4] == 'wait' then
  redis.call('HSET', KEYS[5], 'state', 'waiting')
  redis.call('LPUSH', KEYS[2], ARGV[1])
elseif ARGV[4] == 'delay' then
  redis.call('HSET', KEYS[5], 'state', 'delayed', 'scheduledAt', ARGV[5])
  redis.call('ZADD', KEYS[3], ARGV[5], ARGV[1])
else
  redis.call('HSET', KEYS[5], 'state', 'failed', 'finishedOn', ARGV[2])
  redis.call('ZADD', KEYS[4], ARGV[2], ARGV[1])
end
return 1
"#;

// KEYS: failed, wait, job. ARGV: id.
const RETRY_SCRIPT: &str = r#"
if redis.call('ZREM', KEYS[1], ARGV[1]) == 0 then
  return 0
end
redis.call('HSET', KEYS[3], 'state', 'waiting', 'attemptsMade', 0)
redis.call('HDEL', KEYS[3], 'failedReason', 'finishedOn', 'scheduledAt')
redis.call('LPUSH', KEYS[2], ARGV[1])
return 1
"#;

/// Key names for one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    base: String,
}

impl QueueKeys {
    pub fn new(prefix: &str, kind: JobKind) -> Self {
        Self {
            base: format!("{prefix}:{}", kind.queue_name()),
        }
    }

    pub fn id_counter(&self) -> String {
        format!("{}:id", self.base)
    }

    pub fn wait(&self) -> String {
        format!("{}:wait", self.base)
    }

    pub fn active(&self) -> String {
        format!("{}:active", self.base)
    }

    pub fn leases(&self) -> String {
        format!("{}:leases", self.base)
    }

    pub fn delayed(&self) -> String {
        format!("{}:delayed", self.base)
    }

    pub fn completed(&self) -> String {
        format!("{}:completed", self.base)
    }

    pub fn failed(&self) -> String {
        format!("{}:failed", self.base)
    }

    /// Prefix of job hash keys; the job id is appended.
    pub fn job_prefix(&self) -> String {
        format!("{}:", self.base)
    }

    pub fn job(&self, id: &JobId) -> String {
        format!("{}:{}", self.base, id)
    }
}

struct Scripts {
    enqueue: Script,
    claim: Script,
    extend_lease: Script,
    complete: Script,
    fail: Script,
    retry: Script,
}

impl Scripts {
    fn load() -> Self {
        Self {
            enqueue: Script::new(ENQUEUE_SCRIPT),
            claim: Script::new(CLAIM_SCRIPT),
            extend_lease: Script::new(EXTEND_LEASE_SCRIPT),
            complete: Script::new(COMPLETE_SCRIPT),
            fail: Script::new(FAIL_SCRIPT),
            retry: Script::new(RETRY_SCRIPT),
        }
    }
}

/// Wait between re-sends of a command that hit a lost connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBackoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(50),
            max: Duration::from_secs(5),
        }
    }
}

/// `JobQueue` on Redis.
///
/// Holds one reconnecting connection, shared by every clone of the manager.
/// Build it once per process and inject it where needed.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    prefix: String,
    scripts: std::sync::Arc<Scripts>,
    lease: Duration,
    completed_retention: usize,
    reconnect: ReconnectBackoff,
}

impl core::fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisQueue")
            .field("prefix", &self.prefix)
            .field("lease", &self.lease)
            .field("completed_retention", &self.completed_retention)
            .finish_non_exhaustive()
    }
}

impl RedisQueue {
    /// Connect to the broker, e.g. `redis://localhost:6379`.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        Self::connect_with_prefix(redis_url, DEFAULT_PREFIX).await
    }

    pub async fn connect_with_prefix(redis_url: &str, prefix: &str) -> Result<Self, QueueError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
            scripts: std::sync::Arc::new(Scripts::load()),
            lease: DEFAULT_LEASE,
            completed_retention: DEFAULT_COMPLETED_RETENTION,
            reconnect: ReconnectBackoff::default(),
        })
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Keep at most `keep` completed jobs per queue; older hashes are deleted.
    pub fn with_completed_retention(mut self, keep: usize) -> Self {
        self.completed_retention = keep;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.reconnect = backoff;
        self
    }

    fn keys(&self, kind: JobKind) -> QueueKeys {
        QueueKeys::new(&self.prefix, kind)
    }

    fn lease_deadline(&self, now: i64) -> i64 {
        let lease_ms = i64::try_from(self.lease.as_millis()).unwrap_or(i64::MAX);
        now.saturating_add(lease_ms)
    }

    async fn with_reconnect<T, F, Fut>(&self, op: &'static str, call: F) -> Result<T, QueueError>
    where
        F: FnMut(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        retry_on_disconnect(&self.conn, self.reconnect, op, call).await
    }

    /// Distinguish "no such job" from "job in another state" after a guarded
    /// transition was refused.
    async fn refused(&self, kind: JobKind, id: &JobId, expected: JobStatus) -> QueueError {
        match self.get(kind, id).await {
            Ok(Some(_)) => QueueError::InvalidState {
                queue: kind,
                id: id.clone(),
                expected: expected.as_str(),
            },
            Ok(None) => QueueError::NotFound {
                queue: kind,
                id: id.clone(),
            },
            Err(e) => e,
        }
    }
}

/// The connection is gone; the manager reconnects in the background and the
/// command can be sent again.
fn is_disconnect(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
}

/// Run `call` on a fresh handle until it succeeds or fails for a reason other
/// than a lost connection.
async fn retry_on_disconnect<C, T, F, Fut>(
    conn: &C,
    backoff: ReconnectBackoff,
    op: &'static str,
    mut call: F,
) -> Result<T, QueueError>
where
    C: Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = RedisResult<T>>,
{
    let mut delay = backoff.initial;
    let mut retries: u32 = 0;

    loop {
        match call(conn.clone()).await {
            Ok(value) => {
                if retries > 0 {
                    info!(op, retries, "broker connection restored");
                }
                return Ok(value);
            }
            Err(e) if is_disconnect(&e) => {
                retries += 1;
                warn!(
                    op,
                    retries,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "broker connection lost, re-sending"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(backoff.max);
            }
            Err(e) => return Err(broker_error(op)(e)),
        }
    }
}

fn broker_error(op: &'static str) -> impl FnOnce(RedisError) -> QueueError {
    move |e| {
        if e.is_io_error()
            || e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_timeout()
        {
            QueueError::Connection(format!("{op}: {e}"))
        } else {
            QueueError::Command(format!("{op} failed: {e}"))
        }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn field<'a>(hash: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    hash.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

fn millis(value: &str, name: &str) -> Result<DateTime<Utc>, QueueError> {
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| QueueError::Deserialization(format!("bad `{name}` timestamp `{value}`")))
}

/// Rebuild a job from its hash. `None` when the hash is empty (no such job).
pub fn job_from_hash(
    kind: JobKind,
    id: &JobId,
    hash: &HashMap<String, String>,
) -> Result<Option<Job>, QueueError> {
    if hash.is_empty() {
        return Ok(None);
    }

    let require = |name: &str| {
        field(hash, name)
            .ok_or_else(|| QueueError::Deserialization(format!("job {id} is missing `{name}`")))
    };
    let decode = |e: serde_json::Error| QueueError::Deserialization(e.to_string());
    let optional_millis = |name: &str| field(hash, name).map(|v| millis(v, name)).transpose();

    let data = serde_json::from_str(require("data")?).map_err(decode)?;
    let opts: JobOptions = serde_json::from_str(require("opts")?).map_err(decode)?;
    let status: JobStatus = require("state")?
        .parse()
        .map_err(|e: tasknator_core::DomainError| QueueError::Deserialization(e.to_string()))?;
    let attempts_made = require("attemptsMade")?
        .parse::<u32>()
        .map_err(|e| QueueError::Deserialization(format!("bad `attemptsMade`: {e}")))?;
    let return_value = field(hash, "returnvalue")
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(decode)?;

    Ok(Some(Job {
        id: id.clone(),
        kind,
        data,
        opts,
        status,
        attempts_made,
        created_at: millis(require("timestamp")?, "timestamp")?,
        processed_at: optional_millis("processedOn")?,
        scheduled_at: optional_millis("scheduledAt")?,
        finished_at: optional_millis("finishedOn")?,
        failed_reason: field(hash, "failedReason").map(str::to_string),
        return_value,
    }))
}

#[async_trait]
impl QueueClient for RedisQueue {
    #[instrument(skip(self, data), fields(queue = %kind), err)]
    async fn enqueue(
        &self,
        kind: JobKind,
        data: serde_json::Value,
        opts: JobOptions,
    ) -> Result<JobHandle, QueueError> {
        let keys = self.keys(kind);
        let encode = |e: serde_json::Error| QueueError::Serialization(e.to_string());
        let data = serde_json::to_string(&data).map_err(encode)?;
        let opts = serde_json::to_string(&opts).map_err(encode)?;

        let mut invocation = self.scripts.enqueue.prepare_invoke();
        invocation
            .key(keys.id_counter())
            .key(keys.wait())
            .arg(keys.job_prefix())
            .arg(kind.queue_name())
            .arg(data)
            .arg(opts)
            .arg(now_ms());
        let invocation = &invocation;
        let id: String = self
            .with_reconnect("enqueue", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        debug!(job_id = %id, "job enqueued");
        Ok(JobHandle {
            job_id: JobId::new(id),
            queue: kind,
        })
    }
}

#[async_trait]
impl JobSource for RedisQueue {
    async fn claim_next(&self, kind: JobKind) -> Result<Option<Job>, QueueError> {
        let keys = self.keys(kind);
        let now = now_ms();

        let mut invocation = self.scripts.claim.prepare_invoke();
        invocation
            .key(keys.wait())
            .key(keys.active())
            .key(keys.delayed())
            .key(keys.leases())
            .key(keys.failed())
            .arg(keys.job_prefix())
            .arg(now)
            .arg(self.lease_deadline(now))
            .arg(LEASE_EXPIRED_REASON);
        let invocation = &invocation;
        let claimed: Option<String> = self
            .with_reconnect("claim", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        match claimed {
            Some(id) => self.get(kind, &JobId::new(id)).await,
            None => Ok(None),
        }
    }

    fn lease(&self) -> Duration {
        self.lease
    }

    async fn extend_lease(&self, kind: JobKind, id: &JobId) -> Result<(), QueueError> {
        let keys = self.keys(kind);

        let mut invocation = self.scripts.extend_lease.prepare_invoke();
        invocation
            .key(keys.leases())
            .arg(id.as_str())
            .arg(self.lease_deadline(now_ms()));
        let invocation = &invocation;
        let extended: i64 = self
            .with_reconnect("extend_lease", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        if extended == 0 {
            return Err(self.refused(kind, id, JobStatus::Active).await);
        }
        Ok(())
    }

    #[instrument(skip(self, return_value), fields(queue = %kind, job_id = %id), err)]
    async fn complete(
        &self,
        kind: JobKind,
        id: &JobId,
        return_value: Option<serde_json::Value>,
    ) -> Result<(), QueueError> {
        let keys = self.keys(kind);
        let return_value = match return_value {
            Some(v) => {
                serde_json::to_string(&v).map_err(|e| QueueError::Serialization(e.to_string()))?
            }
            None => String::new(),
        };
        let retention = i64::try_from(self.completed_retention).unwrap_or(i64::MAX);

        let mut invocation = self.scripts.complete.prepare_invoke();
        invocation
            .key(keys.active())
            .key(keys.completed())
            .key(keys.job(id))
            .key(keys.leases())
            .arg(id.as_str())
            .arg(now_ms())
            .arg(return_value)
            .arg(keys.job_prefix())
            .arg(retention);
        let invocation = &invocation;
        let settled: i64 = self
            .with_reconnect("complete", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        if settled == 0 {
            return Err(self.refused(kind, id, JobStatus::Active).await);
        }
        Ok(())
    }

    #[instrument(skip(self, reason), fields(queue = %kind, job_id = %id), err)]
    async fn fail(
        &self,
        kind: JobKind,
        id: &JobId,
        reason: &str,
    ) -> Result<FailOutcome, QueueError> {
        let job = self
            .get(kind, id)
            .await?
            .ok_or_else(|| QueueError::NotFound {
                queue: kind,
                id: id.clone(),
            })?;
        if job.status != JobStatus::Active {
            return Err(QueueError::InvalidState {
                queue: kind,
                id: id.clone(),
                expected: JobStatus::Active.as_str(),
            });
        }

        let outcome = job.next_after_failure();
        let now = now_ms();
        let (mode, ready_at) = match outcome {
            FailOutcome::Retrying { delay, .. } if delay.is_zero() => ("wait", now),
            FailOutcome::Retrying { delay, .. } => {
                let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
                ("delay", now.saturating_add(delay_ms))
            }
            FailOutcome::Dead { .. } => ("dead", now),
        };

        let keys = self.keys(kind);
        let mut invocation = self.scripts.fail.prepare_invoke();
        invocation
            .key(keys.active())
            .key(keys.wait())
            .key(keys.delayed())
            .key(keys.failed())
            .key(keys.job(id))
            .key(keys.leases())
            .arg(id.as_str())
            .arg(now)
            .arg(reason)
            .arg(mode)
            .arg(ready_at);
        let invocation = &invocation;
        let settled: i64 = self
            .with_reconnect("fail", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        if settled == 0 {
            return Err(self.refused(kind, id, JobStatus::Active).await);
        }
        Ok(outcome)
    }

    async fn get(&self, kind: JobKind, id: &JobId) -> Result<Option<Job>, QueueError> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(self.keys(kind).job(id));
        let cmd = &cmd;
        let hash: HashMap<String, String> = self
            .with_reconnect("HGETALL", |mut conn| async move { cmd.query_async(&mut conn).await })
            .await?;

        job_from_hash(kind, id, &hash)
    }

    async fn counts(&self, kind: JobKind) -> Result<JobCounts, QueueError> {
        let keys = self.keys(kind);
        let mut pipe = redis::pipe();
        pipe.cmd("LLEN")
            .arg(keys.wait())
            .cmd("ZCARD")
            .arg(keys.delayed())
            .cmd("LLEN")
            .arg(keys.active())
            .cmd("ZCARD")
            .arg(keys.completed())
            .cmd("ZCARD")
            .arg(keys.failed());
        let pipe = &pipe;

        let (waiting, delayed, active, completed, failed): (u64, u64, u64, u64, u64) = self
            .with_reconnect("counts", |mut conn| async move { pipe.query_async(&mut conn).await })
            .await?;

        Ok(JobCounts {
            waiting,
            delayed,
            active,
            completed,
            failed,
        })
    }

    async fn failed(&self, kind: JobKind, limit: usize) -> Result<Vec<Job>, QueueError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let keys = self.keys(kind);
        let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
        let mut cmd = redis::cmd("ZREVRANGE");
        cmd.arg(keys.failed()).arg(0).arg(stop);
        let cmd = &cmd;
        let ids: Vec<String> = self
            .with_reconnect("ZREVRANGE", |mut conn| async move { cmd.query_async(&mut conn).await })
            .await?;

        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self.get(kind, &JobId::new(id)).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    #[instrument(skip(self), fields(queue = %kind, job_id = %id), err)]
    async fn retry_failed(&self, kind: JobKind, id: &JobId) -> Result<Job, QueueError> {
        let keys = self.keys(kind);

        let mut invocation = self.scripts.retry.prepare_invoke();
        invocation
            .key(keys.failed())
            .key(keys.wait())
            .key(keys.job(id))
            .arg(id.as_str());
        let invocation = &invocation;
        let moved: i64 = self
            .with_reconnect("retry", |mut conn| async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        if moved == 0 {
            return Err(self.refused(kind, id, JobStatus::Failed).await);
        }

        self.get(kind, id).await?.ok_or_else(|| QueueError::NotFound {
            queue: kind,
            id: id.clone(),
        })
    }
}

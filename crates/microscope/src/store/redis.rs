// crates/microscope/src/store/redis.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::store::keys::Keys;
use crate::store::model::{
    page_offset, DeadJob, Job, Page, Queue, RetryJob, ScheduledJob, WorkerObservation,
    WorkerPoolHeartbeat, PAGE_SIZE,
};
use crate::store::writer::WorkWriter;
use crate::store::{StoreError, StoreResult, WorkClient};

// KEYS[1] = dead zset
// ARGV[1] = died_at, ARGV[2] = job id
const DELETE_DEAD_JOB: &str = r#"
local members = redis.call('zrangebyscore', KEYS[1], ARGV[1], ARGV[1])
for _, member in ipairs(members) do
  local job = cjson.decode(member)
  if job['id'] == ARGV[2] then
    return redis.call('zrem', KEYS[1], member)
  end
end
return 0
"#;

// KEYS[1] = dead zset, KEYS[2] = known jobs set
// ARGV[1] = jobs key prefix, ARGV[2] = died_at, ARGV[3] = job id
const RETRY_DEAD_JOB: &str = r#"
local members = redis.call('zrangebyscore', KEYS[1], ARGV[2], ARGV[2])
for _, member in ipairs(members) do
  local job = cjson.decode(member)
  if job['id'] == ARGV[3] then
    if not job['name'] or redis.call('sismember', KEYS[2], job['name']) == 0 then
      return 0
    end
    job['fails'] = nil
    job['err'] = nil
    job['failed_at'] = nil
    redis.call('lpush', ARGV[1] .. job['name'], cjson.encode(job))
    redis.call('zrem', KEYS[1], member)
    return 1
  end
end
return 0
"#;

// KEYS[1] = dead zset, KEYS[2] = known jobs set
// ARGV[1] = jobs key prefix
const RETRY_ALL_DEAD_JOBS: &str = r#"
local members = redis.call('zrange', KEYS[1], 0, -1)
local requeued = 0
for _, member in ipairs(members) do
  local job = cjson.decode(member)
  if job['name'] and redis.call('sismember', KEYS[2], job['name']) == 1 then
    job['fails'] = nil
    job['err'] = nil
    job['failed_at'] = nil
    redis.call('lpush', ARGV[1] .. job['name'], cjson.encode(job))
    redis.call('zrem', KEYS[1], member)
    requeued = requeued + 1
  end
end
return requeued
"#;

/// Queue store client over a Redis connection, scoped to one namespace.
#[derive(Clone)]
pub struct RedisWorkClient {
    conn: ConnectionManager,
    keys: Keys,
}

impl RedisWorkClient {
    pub fn new(conn: ConnectionManager, namespace: &str) -> Self {
        Self {
            conn,
            keys: Keys::new(namespace),
        }
    }

    pub async fn connect(url: &str, namespace: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, namespace))
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn writer(&self) -> WorkWriter {
        WorkWriter::new(self.conn.clone(), self.keys.clone())
    }

    async fn zset_page(&self, key: String, page: u64) -> StoreResult<(Vec<(Job, i64)>, i64)> {
        let mut conn = self.conn.clone();
        let total: i64 = conn.zcard(&key).await?;

        // pages past the addressable range are simply empty
        let Some(offset) = page_offset(page) else {
            return Ok((Vec::new(), total));
        };
        let raw: Vec<(String, f64)> = conn
            .zrangebyscore_limit_withscores(&key, "-inf", "+inf", offset, PAGE_SIZE as isize)
            .await?;

        let items = raw
            .into_iter()
            .map(|(member, score)| Ok((serde_json::from_str::<Job>(&member)?, score as i64)))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((items, total))
    }
}

#[async_trait]
impl WorkClient for RedisWorkClient {
    async fn queues(&self) -> StoreResult<Vec<Queue>> {
        let mut conn = self.conn.clone();

        let mut names: Vec<String> = conn.smembers(self.keys.known_jobs()).await?;
        if names.is_empty() {
            return Ok(Vec::new());
        }
        names.sort();

        let mut counts_pipe = redis::pipe();
        let mut oldest_pipe = redis::pipe();
        for name in &names {
            counts_pipe.llen(self.keys.jobs(name));
            // newest jobs are pushed on the left, so the oldest sits at the tail
            oldest_pipe.lindex(self.keys.jobs(name), -1);
        }
        let counts: Vec<i64> = counts_pipe.query_async(&mut conn).await?;
        let oldest: Vec<Option<String>> = oldest_pipe.query_async(&mut conn).await?;

        let now = Utc::now().timestamp();
        names
            .into_iter()
            .zip(counts)
            .zip(oldest)
            .map(|((job_name, count), oldest)| {
                let latency = match oldest {
                    Some(raw) => {
                        let job: Job = serde_json::from_str(&raw)?;
                        (now - job.enqueued_at).max(0)
                    }
                    None => 0,
                };
                Ok(Queue {
                    job_name,
                    count,
                    latency,
                })
            })
            .collect()
    }

    async fn worker_pool_heartbeats(&self) -> StoreResult<Vec<WorkerPoolHeartbeat>> {
        let mut conn = self.conn.clone();

        let mut pool_ids: Vec<String> = conn.smembers(self.keys.worker_pools()).await?;
        if pool_ids.is_empty() {
            return Ok(Vec::new());
        }
        pool_ids.sort();

        let mut pipe = redis::pipe();
        for id in &pool_ids {
            pipe.hgetall(self.keys.heartbeat(id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        Ok(pool_ids
            .into_iter()
            .zip(hashes)
            .map(|(id, hash)| heartbeat_from_hash(id, &hash))
            .collect())
    }

    async fn worker_observations(&self) -> StoreResult<Vec<WorkerObservation>> {
        let heartbeats = self.worker_pool_heartbeats().await?;

        let mut worker_ids: Vec<String> = heartbeats
            .into_iter()
            .flat_map(|hb| hb.worker_ids)
            .collect();
        if worker_ids.is_empty() {
            return Ok(Vec::new());
        }
        worker_ids.sort();

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for id in &worker_ids {
            pipe.hgetall(self.keys.worker_observation(id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        Ok(worker_ids
            .into_iter()
            .zip(hashes)
            .map(|(id, hash)| observation_from_hash(id, &hash))
            .collect())
    }

    async fn retry_jobs(&self, page: u64) -> StoreResult<Page<RetryJob>> {
        let (items, total) = self.zset_page(self.keys.retry(), page).await?;
        Ok(Page {
            items: items
                .into_iter()
                .map(|(job, retry_at)| RetryJob { retry_at, job })
                .collect(),
            total,
        })
    }

    async fn scheduled_jobs(&self, page: u64) -> StoreResult<Page<ScheduledJob>> {
        let (items, total) = self.zset_page(self.keys.scheduled(), page).await?;
        Ok(Page {
            items: items
                .into_iter()
                .map(|(job, run_at)| ScheduledJob { run_at, job })
                .collect(),
            total,
        })
    }

    async fn dead_jobs(&self, page: u64) -> StoreResult<Page<DeadJob>> {
        let (items, total) = self.zset_page(self.keys.dead(), page).await?;
        Ok(Page {
            items: items
                .into_iter()
                .map(|(job, died_at)| DeadJob { died_at, job })
                .collect(),
            total,
        })
    }

    async fn delete_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = Script::new(DELETE_DEAD_JOB)
            .key(self.keys.dead())
            .arg(died_at)
            .arg(job_id)
            .invoke_async(&mut conn)
            .await?;

        if removed == 0 {
            return Err(StoreError::NotDeleted);
        }
        Ok(())
    }

    async fn retry_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let requeued: i64 = Script::new(RETRY_DEAD_JOB)
            .key(self.keys.dead())
            .key(self.keys.known_jobs())
            .arg(self.keys.jobs_prefix())
            .arg(died_at)
            .arg(job_id)
            .invoke_async(&mut conn)
            .await?;

        if requeued == 0 {
            return Err(StoreError::NotRetried);
        }
        Ok(())
    }

    async fn delete_all_dead_jobs(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(self.keys.dead()).await?;
        Ok(())
    }

    async fn retry_all_dead_jobs(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let requeued: i64 = Script::new(RETRY_ALL_DEAD_JOBS)
            .key(self.keys.dead())
            .key(self.keys.known_jobs())
            .arg(self.keys.jobs_prefix())
            .invoke_async(&mut conn)
            .await?;

        tracing::info!(requeued, "retried dead jobs");
        Ok(())
    }
}

fn field_i64(hash: &HashMap<String, String>, name: &str) -> i64 {
    hash.get(name).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn field_list(hash: &HashMap<String, String>, name: &str) -> Vec<String> {
    hash.get(name)
        .map(|v| {
            v.split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn field_string(hash: &HashMap<String, String>, name: &str) -> String {
    hash.get(name).cloned().unwrap_or_default()
}

pub(crate) fn heartbeat_from_hash(
    worker_pool_id: String,
    hash: &HashMap<String, String>,
) -> WorkerPoolHeartbeat {
    WorkerPoolHeartbeat {
        worker_pool_id,
        started_at: field_i64(hash, "started_at"),
        heartbeat_at: field_i64(hash, "heartbeat_at"),
        job_names: field_list(hash, "job_names"),
        concurrency: hash
            .get("concurrency")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        host: field_string(hash, "host"),
        pid: field_i64(hash, "pid"),
        worker_ids: field_list(hash, "worker_ids"),
    }
}

pub(crate) fn observation_from_hash(
    worker_id: String,
    hash: &HashMap<String, String>,
) -> WorkerObservation {
    // idle workers have their observation hash removed
    if hash.is_empty() {
        return WorkerObservation {
            worker_id,
            ..Default::default()
        };
    }

    WorkerObservation {
        worker_id,
        is_busy: true,
        job_name: field_string(hash, "job_name"),
        job_id: field_string(hash, "job_id"),
        started_at: field_i64(hash, "started_at"),
        args_json: field_string(hash, "args"),
        checkin: field_string(hash, "checkin"),
        checkin_at: field_i64(hash, "checkin_at"),
    }
}

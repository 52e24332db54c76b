// crates/microscope/src/store/writer.rs
//
// Writes records in the layout the queue engine uses. The dashboard never
// calls these over HTTP; they back `microscopectl` and the integration tests.

use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::keys::Keys;
use crate::store::model::{Job, WorkerObservation, WorkerPoolHeartbeat};
use crate::store::StoreResult;

pub fn new_job(name: &str, args: Map<String, Value>) -> Job {
    Job {
        name: name.to_string(),
        id: Uuid::new_v4().simple().to_string(),
        enqueued_at: Utc::now().timestamp(),
        args,
        unique: false,
        unique_key: String::new(),
        fails: 0,
        last_err: String::new(),
        failed_at: 0,
    }
}

#[derive(Clone)]
pub struct WorkWriter {
    conn: ConnectionManager,
    keys: Keys,
}

impl WorkWriter {
    pub fn new(conn: ConnectionManager, keys: Keys) -> Self {
        Self { conn, keys }
    }

    pub async fn register_job(&self, name: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.sadd(self.keys.known_jobs(), name).await?;
        Ok(())
    }

    pub async fn enqueue(&self, job: &Job) -> StoreResult<()> {
        self.register_job(&job.name).await?;

        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(job)?;
        let _: i64 = conn.lpush(self.keys.jobs(&job.name), raw).await?;
        Ok(())
    }

    pub async fn schedule(&self, job: &Job, run_at: i64) -> StoreResult<()> {
        self.register_job(&job.name).await?;
        self.zadd(self.keys.scheduled(), job, run_at).await
    }

    pub async fn add_retry(&self, job: &Job, retry_at: i64) -> StoreResult<()> {
        self.zadd(self.keys.retry(), job, retry_at).await
    }

    pub async fn add_dead(&self, job: &Job, died_at: i64) -> StoreResult<()> {
        self.zadd(self.keys.dead(), job, died_at).await
    }

    pub async fn write_heartbeat(&self, hb: &WorkerPoolHeartbeat) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .sadd(self.keys.worker_pools(), &hb.worker_pool_id)
            .await?;

        let fields = [
            ("heartbeat_at", hb.heartbeat_at.to_string()),
            ("started_at", hb.started_at.to_string()),
            ("job_names", hb.job_names.join(",")),
            ("concurrency", hb.concurrency.to_string()),
            ("worker_ids", hb.worker_ids.join(",")),
            ("host", hb.host.clone()),
            ("pid", hb.pid.to_string()),
        ];
        let _: () = conn
            .hset_multiple(self.keys.heartbeat(&hb.worker_pool_id), &fields)
            .await?;
        Ok(())
    }

    /// Writes a busy observation, or clears it when the worker is idle.
    pub async fn write_observation(&self, ob: &WorkerObservation) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let key = self.keys.worker_observation(&ob.worker_id);

        if !ob.is_busy {
            let _: i64 = conn.del(key).await?;
            return Ok(());
        }

        let fields = [
            ("job_name", ob.job_name.clone()),
            ("job_id", ob.job_id.clone()),
            ("started_at", ob.started_at.to_string()),
            ("args", ob.args_json.clone()),
            ("checkin", ob.checkin.clone()),
            ("checkin_at", ob.checkin_at.to_string()),
        ];
        let _: () = conn.hset_multiple(key, &fields).await?;
        Ok(())
    }

    /// Deletes every key under the namespace prefix. Returns the number removed.
    pub async fn reset(&self) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.keys.prefix());

        let mut found = Vec::new();
        {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                found.push(key);
            }
        }

        if found.is_empty() {
            return Ok(0);
        }
        let removed: i64 = conn.del(found).await?;
        Ok(removed)
    }

    async fn zadd(&self, key: String, job: &Job, score: i64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(job)?;
        let _: i64 = conn.zadd(key, raw, score).await?;
        Ok(())
    }
}

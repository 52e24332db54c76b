pub mod keys;
pub mod model;
pub mod redis;
pub mod writer;

use async_trait::async_trait;
use thiserror::Error;

pub use keys::Keys;
pub use model::{
    page_offset, DeadJob, Job, Page, Queue, RetryJob, ScheduledJob, WorkerObservation,
    WorkerPoolHeartbeat, PAGE_SIZE,
};
pub use redis::RedisWorkClient;
pub use writer::WorkWriter;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("nothing deleted")]
    NotDeleted,

    #[error("nothing retried")]
    NotRetried,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the queue store plus the four dead-job actions.
///
/// Pages are 1-based. Implementations forward straight to the store and do
/// not retry.
#[async_trait]
pub trait WorkClient: Send + Sync {
    async fn queues(&self) -> StoreResult<Vec<Queue>>;

    async fn worker_pool_heartbeats(&self) -> StoreResult<Vec<WorkerPoolHeartbeat>>;

    async fn worker_observations(&self) -> StoreResult<Vec<WorkerObservation>>;

    async fn retry_jobs(&self, page: u64) -> StoreResult<Page<RetryJob>>;

    async fn scheduled_jobs(&self, page: u64) -> StoreResult<Page<ScheduledJob>>;

    async fn dead_jobs(&self, page: u64) -> StoreResult<Page<DeadJob>>;

    async fn delete_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()>;

    async fn retry_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()>;

    async fn delete_all_dead_jobs(&self) -> StoreResult<()>;

    async fn retry_all_dead_jobs(&self) -> StoreResult<()>;
}

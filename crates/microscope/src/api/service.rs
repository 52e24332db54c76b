// crates/microscope/src/api/service.rs
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::models::{ListResponse, PageResponse, StatusResponse};
use crate::store::{
    DeadJob, Queue, RetryJob, ScheduledJob, WorkClient, WorkerObservation, WorkerPoolHeartbeat,
};

/// Parses the `page` query value. Absent, empty and `0` all mean page 1.
pub fn parse_page(raw: Option<&str>) -> Result<u64, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(v) => v,
    };

    let page: u64 = raw
        .parse()
        .map_err(|_| ApiError::InvalidPage(raw.to_string()))?;
    Ok(page.max(1))
}

pub fn parse_died_at(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidTimestamp(raw.to_string()))
}

#[derive(Clone)]
pub struct QueryService {
    client: Arc<dyn WorkClient>,
}

impl QueryService {
    pub fn new(client: Arc<dyn WorkClient>) -> Self {
        Self { client }
    }

    pub async fn queues(&self) -> Result<ListResponse<Queue>, ApiError> {
        let entries = self.client.queues().await?;
        Ok(ListResponse { entries })
    }

    pub async fn worker_pools(&self) -> Result<ListResponse<WorkerPoolHeartbeat>, ApiError> {
        let entries = self.client.worker_pool_heartbeats().await?;
        Ok(ListResponse { entries })
    }

    pub async fn busy_workers(&self) -> Result<ListResponse<WorkerObservation>, ApiError> {
        let entries = self
            .client
            .worker_observations()
            .await?
            .into_iter()
            .filter(|ob| ob.is_busy)
            .collect();
        Ok(ListResponse { entries })
    }

    pub async fn retry_jobs(&self, page: Option<&str>) -> Result<PageResponse<RetryJob>, ApiError> {
        let page = parse_page(page)?;
        let res = self.client.retry_jobs(page).await?;
        Ok(PageResponse {
            count: res.total,
            entries: res.items,
        })
    }

    pub async fn scheduled_jobs(
        &self,
        page: Option<&str>,
    ) -> Result<PageResponse<ScheduledJob>, ApiError> {
        let page = parse_page(page)?;
        let res = self.client.scheduled_jobs(page).await?;
        Ok(PageResponse {
            count: res.total,
            entries: res.items,
        })
    }

    pub async fn dead_jobs(&self, page: Option<&str>) -> Result<PageResponse<DeadJob>, ApiError> {
        let page = parse_page(page)?;
        let res = self.client.dead_jobs(page).await?;
        Ok(PageResponse {
            count: res.total,
            entries: res.items,
        })
    }

    pub async fn delete_dead_job(
        &self,
        died_at: &str,
        job_id: &str,
    ) -> Result<StatusResponse, ApiError> {
        let died_at = parse_died_at(died_at)?;
        self.client.delete_dead_job(died_at, job_id).await?;
        Ok(StatusResponse::ok())
    }

    pub async fn retry_dead_job(
        &self,
        died_at: &str,
        job_id: &str,
    ) -> Result<StatusResponse, ApiError> {
        let died_at = parse_died_at(died_at)?;
        self.client.retry_dead_job(died_at, job_id).await?;
        Ok(StatusResponse::ok())
    }

    pub async fn delete_all_dead_jobs(&self) -> Result<StatusResponse, ApiError> {
        self.client.delete_all_dead_jobs().await?;
        Ok(StatusResponse::ok())
    }

    pub async fn retry_all_dead_jobs(&self) -> Result<StatusResponse, ApiError> {
        self.client.retry_all_dead_jobs().await?;
        Ok(StatusResponse::ok())
    }
}

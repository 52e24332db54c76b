#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use microscope::api::{Dashboard, RoutePaths};
use microscope::config::default_static_dir;
use microscope::store::{
    page_offset, DeadJob, Job, Page, Queue, RetryJob, ScheduledJob, StoreError, StoreResult,
    WorkClient, WorkerObservation, WorkerPoolHeartbeat, PAGE_SIZE,
};
use microscope::ui::{Ui, UiSettings};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

/// In-memory stand-in for the queue store. Records every call it receives.
#[derive(Default)]
pub struct FakeClient {
    pub queues: Vec<Queue>,
    pub heartbeats: Vec<WorkerPoolHeartbeat>,
    pub observations: Vec<WorkerObservation>,
    pub retry: Vec<RetryJob>,
    pub scheduled: Vec<ScheduledJob>,
    pub dead: Vec<DeadJob>,
    /// Overrides the reported total for every paginated listing.
    pub total: Option<i64>,
    pub failing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            return Err(StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        Ok(())
    }

    fn page<T: Clone>(&self, items: &[T], page: u64) -> Page<T> {
        let total = self.total.unwrap_or(items.len() as i64);
        let Some(start) = page_offset(page) else {
            return Page {
                items: Vec::new(),
                total,
            };
        };
        Page {
            items: items
                .iter()
                .skip(start as usize)
                .take(PAGE_SIZE as usize)
                .cloned()
                .collect(),
            total,
        }
    }
}

#[async_trait]
impl WorkClient for FakeClient {
    async fn queues(&self) -> StoreResult<Vec<Queue>> {
        self.record("queues".into())?;
        Ok(self.queues.clone())
    }

    async fn worker_pool_heartbeats(&self) -> StoreResult<Vec<WorkerPoolHeartbeat>> {
        self.record("worker_pool_heartbeats".into())?;
        Ok(self.heartbeats.clone())
    }

    async fn worker_observations(&self) -> StoreResult<Vec<WorkerObservation>> {
        self.record("worker_observations".into())?;
        Ok(self.observations.clone())
    }

    async fn retry_jobs(&self, page: u64) -> StoreResult<Page<RetryJob>> {
        self.record(format!("retry_jobs:{page}"))?;
        Ok(self.page(&self.retry, page))
    }

    async fn scheduled_jobs(&self, page: u64) -> StoreResult<Page<ScheduledJob>> {
        self.record(format!("scheduled_jobs:{page}"))?;
        Ok(self.page(&self.scheduled, page))
    }

    async fn dead_jobs(&self, page: u64) -> StoreResult<Page<DeadJob>> {
        self.record(format!("dead_jobs:{page}"))?;
        Ok(self.page(&self.dead, page))
    }

    async fn delete_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()> {
        self.record(format!("delete_dead_job:{died_at}:{job_id}"))
    }

    async fn retry_dead_job(&self, died_at: i64, job_id: &str) -> StoreResult<()> {
        self.record(format!("retry_dead_job:{died_at}:{job_id}"))
    }

    async fn delete_all_dead_jobs(&self) -> StoreResult<()> {
        self.record("delete_all_dead_jobs".into())
    }

    async fn retry_all_dead_jobs(&self) -> StoreResult<()> {
        self.record("retry_all_dead_jobs".into())
    }
}

pub fn job(name: &str, id: &str) -> Job {
    Job {
        name: name.to_string(),
        id: id.to_string(),
        enqueued_at: 1_620_000_000,
        args: Map::new(),
        unique: false,
        unique_key: String::new(),
        fails: 0,
        last_err: String::new(),
        failed_at: 0,
    }
}

pub fn dead_job(id: &str, died_at: i64) -> DeadJob {
    let mut job = job("send_email", id);
    job.fails = 25;
    job.last_err = "smtp timeout".into();
    job.failed_at = died_at;
    DeadJob { died_at, job }
}

pub fn observation(worker_id: &str, busy: bool) -> WorkerObservation {
    WorkerObservation {
        worker_id: worker_id.to_string(),
        is_busy: busy,
        job_name: if busy { "send_email".into() } else { String::new() },
        job_id: if busy {
            format!("job-of-{worker_id}")
        } else {
            String::new()
        },
        ..Default::default()
    }
}

pub fn dashboard(client: Arc<FakeClient>, prefix: &str) -> Dashboard {
    let paths = RoutePaths::new(prefix);
    let ui = Ui::load(
        default_static_dir(),
        false,
        &paths,
        UiSettings {
            app_name: "Microscope".into(),
            timezone: "UTC".into(),
            recording: false,
        },
    )
    .expect("bundled ui should load");
    Dashboard::new(client, ui, paths)
}

pub fn app(client: Arc<FakeClient>) -> Router {
    microscope::router(dashboard(client, "microscope"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be json")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

pub async fn send(app: &Router, method: &str, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, "GET", uri).await
}

pub async fn post(app: &Router, uri: &str) -> TestResponse {
    send(app, "POST", uri).await
}

use std::sync::Arc;

use axum::http::Method;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, on, MethodFilter, MethodRouter};
use axum::{
    extract::{Path, Query, State},
    Router,
};
use serde::Deserialize;

use crate::config::Config;
use crate::store::{RedisWorkClient, WorkClient};
use crate::ui::{Ui, UiSettings};

pub mod error;
pub mod models;
pub mod routes;
pub mod service;

pub use error::ApiError;
pub use routes::{
    is_reserved_prefix, register_api, Endpoint, RoutePaths, RouteRegistrar, RouteTable,
    STATIC_MOUNT,
};
pub use service::QueryService;

use models::PrettyJson;

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct Dashboard {
    pub service: QueryService,
    pub ui: Arc<Ui>,
    pub paths: Arc<RoutePaths>,
}

impl Dashboard {
    pub fn new(client: Arc<dyn WorkClient>, ui: Ui, paths: RoutePaths) -> Self {
        Self {
            service: QueryService::new(client),
            ui: Arc::new(ui),
            paths: Arc::new(paths),
        }
    }

    /// Connects to the store and loads the UI. Any failure here is fatal.
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let paths = RoutePaths::new(&cfg.route_prefix);
        let ui = Ui::load(
            &cfg.static_dir,
            cfg.production,
            &paths,
            UiSettings {
                app_name: "Microscope".to_string(),
                timezone: cfg.timezone.clone(),
                recording: false,
            },
        )?;

        let client = RedisWorkClient::connect(&cfg.redis_url, &cfg.namespace)
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to {}: {e}", cfg.redis_url))?;

        Ok(Self::new(Arc::new(client), ui, paths))
    }
}

/// Standalone application: dashboard routes plus `/healthz`.
pub fn router(dashboard: Dashboard) -> Router {
    routes(dashboard).route("/healthz", get(health))
}

/// Adds the dashboard to an application that has its own state type.
pub fn mount<S>(host: Router<S>, dashboard: Dashboard) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    host.merge(routes::<S>(dashboard))
}

fn routes<S>(dashboard: Dashboard) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let paths = dashboard.paths.clone();

    let mut app = Router::new().nest_service(STATIC_MOUNT, dashboard.ui.static_service());
    for path in paths.index_routes() {
        app = app.route(&path, get(index));
    }

    let app = register_api(AxumRegistrar(app), &paths).0;
    app.with_state(dashboard)
}

struct AxumRegistrar(Router<Dashboard>);

impl RouteRegistrar for AxumRegistrar {
    fn register(self, method: Method, path: &str, endpoint: Endpoint) -> Self {
        AxumRegistrar(self.0.route(path, method_router(method, endpoint)))
    }
}

fn method_router(method: Method, endpoint: Endpoint) -> MethodRouter<Dashboard> {
    let filter = if method == Method::POST {
        MethodFilter::POST
    } else {
        MethodFilter::GET
    };

    match endpoint {
        Endpoint::Queues => on(filter, queues),
        Endpoint::WorkerPools => on(filter, worker_pools),
        Endpoint::BusyWorkers => on(filter, busy_workers),
        Endpoint::RetryJobs => on(filter, retry_jobs),
        Endpoint::ScheduledJobs => on(filter, scheduled_jobs),
        Endpoint::DeadJobs => on(filter, dead_jobs),
        Endpoint::DeleteDeadJob => on(filter, delete_dead_job),
        Endpoint::RetryDeadJob => on(filter, retry_dead_job),
        Endpoint::DeleteAllDeadJobs => on(filter, delete_all_dead_jobs),
        Endpoint::RetryAllDeadJobs => on(filter, retry_all_dead_jobs),
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(d): State<Dashboard>) -> Html<String> {
    Html(d.ui.render_index())
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

type ApiResult = Result<Response, ApiError>;

async fn queues(State(d): State<Dashboard>) -> ApiResult {
    Ok(PrettyJson::ok(d.service.queues().await?).into_response())
}

async fn worker_pools(State(d): State<Dashboard>) -> ApiResult {
    Ok(PrettyJson::ok(d.service.worker_pools().await?).into_response())
}

async fn busy_workers(State(d): State<Dashboard>) -> ApiResult {
    Ok(PrettyJson::ok(d.service.busy_workers().await?).into_response())
}

async fn retry_jobs(State(d): State<Dashboard>, Query(q): Query<PageQuery>) -> ApiResult {
    let res = d.service.retry_jobs(q.page.as_deref()).await?;
    Ok(PrettyJson::ok(res).into_response())
}

async fn scheduled_jobs(State(d): State<Dashboard>, Query(q): Query<PageQuery>) -> ApiResult {
    let res = d.service.scheduled_jobs(q.page.as_deref()).await?;
    Ok(PrettyJson::ok(res).into_response())
}

async fn dead_jobs(State(d): State<Dashboard>, Query(q): Query<PageQuery>) -> ApiResult {
    let res = d.service.dead_jobs(q.page.as_deref()).await?;
    Ok(PrettyJson::ok(res).into_response())
}

async fn delete_dead_job(
    State(d): State<Dashboard>,
    Path((died_at, job_id)): Path<(String, String)>,
) -> ApiResult {
    let res = d.service.delete_dead_job(&died_at, &job_id).await?;
    tracing::info!(%died_at, %job_id, "deleted dead job");
    Ok(PrettyJson::ok(res).into_response())
}

async fn retry_dead_job(
    State(d): State<Dashboard>,
    Path((died_at, job_id)): Path<(String, String)>,
) -> ApiResult {
    let res = d.service.retry_dead_job(&died_at, &job_id).await?;
    tracing::info!(%died_at, %job_id, "retried dead job");
    Ok(PrettyJson::ok(res).into_response())
}

async fn delete_all_dead_jobs(State(d): State<Dashboard>) -> ApiResult {
    let res = d.service.delete_all_dead_jobs().await?;
    tracing::info!("deleted all dead jobs");
    Ok(PrettyJson::ok(res).into_response())
}

async fn retry_all_dead_jobs(State(d): State<Dashboard>) -> ApiResult {
    Ok(PrettyJson::ok(d.service.retry_all_dead_jobs().await?).into_response())
}

// crates/microscope/src/api/routes.rs
use axum::http::Method;

/// The JSON operations the dashboard exposes under `<prefix>/api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Queues,
    WorkerPools,
    BusyWorkers,
    RetryJobs,
    ScheduledJobs,
    DeadJobs,
    DeleteDeadJob,
    RetryDeadJob,
    DeleteAllDeadJobs,
    RetryAllDeadJobs,
}

impl Endpoint {
    pub const ALL: [Endpoint; 10] = [
        Endpoint::Queues,
        Endpoint::WorkerPools,
        Endpoint::BusyWorkers,
        Endpoint::RetryJobs,
        Endpoint::ScheduledJobs,
        Endpoint::DeadJobs,
        Endpoint::DeleteDeadJob,
        Endpoint::RetryDeadJob,
        Endpoint::DeleteAllDeadJobs,
        Endpoint::RetryAllDeadJobs,
    ];

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Queues
            | Endpoint::WorkerPools
            | Endpoint::BusyWorkers
            | Endpoint::RetryJobs
            | Endpoint::ScheduledJobs
            | Endpoint::DeadJobs => Method::GET,
            Endpoint::DeleteDeadJob
            | Endpoint::RetryDeadJob
            | Endpoint::DeleteAllDeadJobs
            | Endpoint::RetryAllDeadJobs => Method::POST,
        }
    }

    /// Path relative to the api base, in axum's `:param` syntax.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Queues => "queues",
            Endpoint::WorkerPools => "worker_pools",
            Endpoint::BusyWorkers => "busy_workers",
            Endpoint::RetryJobs => "retry_jobs",
            Endpoint::ScheduledJobs => "scheduled_jobs",
            Endpoint::DeadJobs => "dead_jobs",
            Endpoint::DeleteDeadJob => "delete_dead_job/:died_at/:job_id",
            Endpoint::RetryDeadJob => "retry_dead_job/:died_at/:job_id",
            Endpoint::DeleteAllDeadJobs => "delete_all_dead_jobs",
            Endpoint::RetryAllDeadJobs => "retry_all_dead_jobs",
        }
    }
}

/// Mount point of the static assets. Always at the root, whatever the prefix.
pub const STATIC_MOUNT: &str = "/static";

/// True when `prefix` would place the dashboard under [`STATIC_MOUNT`],
/// where its routes collide with the asset service.
pub fn is_reserved_prefix(prefix: &str) -> bool {
    let first = prefix.trim().trim_matches('/').split('/').next().unwrap_or("");
    first == STATIC_MOUNT.trim_start_matches('/')
}

/// URL layout for one route prefix. An empty prefix mounts at `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    base: String,
}

impl RoutePaths {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_matches('/');
        let base = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self { base }
    }

    /// `/prefix`, or empty when mounted at the root.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn index_routes(&self) -> Vec<String> {
        if self.base.is_empty() {
            vec!["/".to_string(), "/#/*paths".to_string()]
        } else {
            vec![
                self.base.clone(),
                format!("{}/", self.base),
                format!("{}/#/*paths", self.base),
            ]
        }
    }

    pub fn api_base(&self) -> String {
        format!("{}/api/", self.base)
    }

    pub fn api(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.api_base(), endpoint.path())
    }
}

/// Anything that can bind a method and path to a dashboard endpoint.
pub trait RouteRegistrar: Sized {
    fn register(self, method: Method, path: &str, endpoint: Endpoint) -> Self;
}

pub fn register_api<R: RouteRegistrar>(registrar: R, paths: &RoutePaths) -> R {
    Endpoint::ALL
        .iter()
        .fold(registrar, |r, ep| r.register(ep.method(), &paths.api(*ep), *ep))
}

/// Records registrations instead of serving them.
#[derive(Debug, Default)]
pub struct RouteTable {
    pub routes: Vec<(Method, String, Endpoint)>,
}

impl RouteRegistrar for RouteTable {
    fn register(mut self, method: Method, path: &str, endpoint: Endpoint) -> Self {
        self.routes.push((method, path.to_string(), endpoint));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(RoutePaths::new("microscope").base(), "/microscope");
        assert_eq!(RoutePaths::new("/microscope/").base(), "/microscope");
        assert_eq!(RoutePaths::new("").base(), "");
        assert_eq!(RoutePaths::new("/").api_base(), "/api/");
    }

    #[test]
    fn route_table_lists_every_endpoint() {
        let table = register_api(RouteTable::default(), &RoutePaths::new("microscope"));

        assert_eq!(table.routes.len(), Endpoint::ALL.len());
        assert!(table.routes.contains(&(
            Method::GET,
            "/microscope/api/dead_jobs".to_string(),
            Endpoint::DeadJobs
        )));
        assert!(table.routes.contains(&(
            Method::POST,
            "/microscope/api/retry_dead_job/:died_at/:job_id".to_string(),
            Endpoint::RetryDeadJob
        )));
    }

    #[test]
    fn static_prefix_is_reserved() {
        assert!(is_reserved_prefix("static"));
        assert!(is_reserved_prefix("/static/"));
        assert!(is_reserved_prefix("static/jobs"));
        assert!(!is_reserved_prefix("statics"));
        assert!(!is_reserved_prefix("admin/static"));
        assert!(!is_reserved_prefix(""));
    }

    #[test]
    fn root_mount_index_routes() {
        assert_eq!(
            RoutePaths::new("").index_routes(),
            vec!["/".to_string(), "/#/*paths".to_string()]
        );
    }
}

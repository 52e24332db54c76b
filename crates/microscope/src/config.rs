use std::path::PathBuf;

use crate::api::{is_reserved_prefix, STATIC_MOUNT};

// Config is the one place runtime settings are read.
// Every value comes from the environment (or a .env file) with a default,
// so a bare `microscope` run talks to a local redis on port 6379.
#[derive(Clone, Debug)]
pub struct Config {
    pub redis_url: String,
    pub namespace: String,
    pub route_prefix: String,
    pub bind_addr: String,
    pub production: bool,
    pub static_dir: PathBuf,
    pub timezone: String,
}

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_NAMESPACE: &str = "work";
pub const DEFAULT_ROUTE_PREFIX: &str = "microscope";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";

pub fn default_static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/ui/dist"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let redis_url = env_or_fallback("MICROSCOPE_REDIS_URL", "REDIS_URL")
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        if !redis_url.starts_with("redis://")
            && !redis_url.starts_with("rediss://")
            && !redis_url.starts_with("redis+unix://")
            && !redis_url.starts_with("unix://")
        {
            anyhow::bail!("MICROSCOPE_REDIS_URL must be a redis:// url, got {redis_url:?}");
        }

        let namespace = env_or_fallback("MICROSCOPE_NAMESPACE", "WORK_NAMESPACE")
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        // an explicitly empty prefix mounts the dashboard at `/`
        let route_prefix = std::env::var("MICROSCOPE_ROUTE_PREFIX")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_ROUTE_PREFIX.to_string());
        if is_reserved_prefix(&route_prefix) {
            anyhow::bail!(
                "MICROSCOPE_ROUTE_PREFIX {route_prefix:?} collides with the {STATIC_MOUNT} asset route"
            );
        }

        let bind_addr = env_or_fallback("MICROSCOPE_BIND_ADDR", "BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let production = env_or_fallback("MICROSCOPE_ENV", "APP_ENV")
            .map(|v| is_production(&v))
            .unwrap_or(false);

        let static_dir = env_or_fallback("MICROSCOPE_STATIC_DIR", "STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_static_dir);

        let timezone = std::env::var("MICROSCOPE_TIMEZONE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "UTC".to_string());

        Ok(Self {
            redis_url,
            namespace,
            route_prefix,
            bind_addr,
            production,
            static_dir,
            timezone,
        })
    }
}

fn is_production(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "prod" | "production")
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

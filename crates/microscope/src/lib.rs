//! Read-only monitoring dashboard for a Redis-backed job queue.
//!
//! [`store`] reads the queue engine's keys, [`api`] exposes them as JSON
//! under a route prefix, and [`ui`] serves the single-page client.

pub mod api;
pub mod config;
pub mod store;
pub mod ui;

pub use api::{mount, router, Dashboard};
pub use config::Config;

use microscope::api::{register_api, RouteTable};
use microscope::{Config, Dashboard};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microscope=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env()?;

    tracing::info!(
        namespace = %cfg.namespace,
        prefix = %cfg.route_prefix,
        production = cfg.production,
        static_dir = %cfg.static_dir.display(),
        "microscope starting"
    );

    let dashboard = Dashboard::from_config(&cfg).await?;

    let table = register_api(RouteTable::default(), &dashboard.paths);
    for (method, path, _) in &table.routes {
        tracing::debug!(%method, %path, "registered route");
    }

    let app = microscope::router(dashboard).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(
        "dashboard listening on http://{}/{}",
        cfg.bind_addr,
        cfg.route_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

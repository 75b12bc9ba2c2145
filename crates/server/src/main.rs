use log::{info, warn};
use plugin_core::config::Config;
use server::{create_app, spawn_cache_sweeper, AppState};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set default log level if not already set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Bedrock node plugin server");

    let config = Config::load_from_env().unwrap_or_else(|e| {
        warn!("Could not load config ({}), using development defaults", e);
        let mut config = Config::default();
        config.server = config.server.with_env_overrides();
        config
    });

    let state = AppState::from_config(&config)?;
    info!(
        "Registered nodes: {}",
        state.registry.list_nodes().join(", ")
    );

    let _sweeper = spawn_cache_sweeper(
        state.provider.cache().clone(),
        Duration::from_secs(config.cache.sweep_interval_secs.max(1)),
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;

    info!("Server running on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

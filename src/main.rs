use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use portfolio_chat::{
    config::ProxyConfig,
    policy::Policy,
    routes,
    state::AppState,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = ProxyConfig::from_env()?;
    let policy = match &config.policy_path {
        Some(path) => Policy::load(path).await?,
        None => Policy::builtin()?,
    };

    tracing::info!(
        model = %config.model,
        max_tokens = config.max_tokens,
        policy = %policy.version,
        "chat proxy configured"
    );

    let state = Arc::new(AppState::from_config(&config, policy));

    let app: Router = routes::create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "chat proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving chat proxy")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

//! PavePath Server - hazard-aware route planning over HTTP

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pavepath_server::api;
use pavepath_server::config::Config;
use pavepath_server::state::AppState;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pavepath_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting PavePath Server...");

    let config = Config::from_env();
    tracing::debug!(?config, "configuration loaded");
    let rules = config.load_rules()?;

    // Provider clients block internally; they are built and dropped outside
    // the runtime.
    let state = Arc::new(
        AppState::from_config(&config, rules).context("configuring routing providers")?,
    );

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(serve(state.clone(), config.server_port))?;
    drop(runtime);
    Ok(())
}

async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

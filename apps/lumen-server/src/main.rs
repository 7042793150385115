mod app;
mod routes;
mod telemetry;

use anyhow::Context;
use tracing::info;

use lumen_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        "Starting lumen-server on {} (llm {}, cache {}, warehouse {}, metadata {})",
        config.server.address(),
        enabled(config.llm.is_enabled()),
        enabled(config.cache.url.is_some()),
        enabled(config.warehouse.url.is_some()),
        enabled(config.metadata.url.is_some()),
    );

    let state = app::build_state(&config).await?;
    let router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.server.address())
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, router)
        .await
        .context("server terminated")?;

    Ok(())
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

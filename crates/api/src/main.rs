use anyhow::Context;

use invoicer_api::AppConfig;
use invoicer_infra::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    invoicer_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store = SqliteStore::connect(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let app = invoicer_api::build_app(store.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

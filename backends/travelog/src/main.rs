use travelog::{config::Config, logging, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_level, config.log_json)?;

    let state = AppState::from_config(&config).await?;

    if config.sweep_uploads_on_start {
        match state.sweep_uploads().await {
            Ok(removed) => tracing::info!(removed, "swept orphaned uploads"),
            Err(err) => tracing::warn!(error = ?err, "upload sweep failed"),
        }
    }

    let app = routes::generate_routes(state, &config)?;

    tracing::info!(addr = %config.bind_addr, "listening");
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

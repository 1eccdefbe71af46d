use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use db::DBService;
use server::{config::Config, create_router, state::AppState};
use tracing::{debug, info, warn};
use utils::{logging::init_tracing, sentry as sentry_utils};

const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in deployed environments.
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("invalid configuration")?;
    sentry_utils::init_once(config.sentry_dsn.as_deref(), &config.environment.to_string());
    init_tracing(config.is_production());

    let db = DBService::new(&config.database_url, &config.db)
        .await
        .context("failed to connect to the database")?;

    let state = AppState::new(config.clone(), db);
    match state.validator.validate().await {
        Ok(result) if result.is_ok() => info!("{}", result.summary()),
        Ok(result) => warn!("{}", result.summary()),
        Err(e) => warn!(error = %e, "Startup schema validation failed"),
    }

    let rate_limits = state.rate_limits.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP);
        loop {
            interval.tick().await;
            rate_limits.retain_recent();
            debug!(clients = rate_limits.tracked_clients(), "Swept rate limiter state");
        }
    });

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, environment = %config.environment, "Server listening");

    axum::serve(
        listener,
        create_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

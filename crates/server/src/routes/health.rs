//! Liveness, readiness and a detailed health report.

use std::time::{Duration, Instant};

use axum::{Router, extract::State, http::StatusCode, response::Json as ResponseJson, routing::get};
use serde::Serialize;

use crate::state::AppState;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub uptime_secs: u64,
    pub database: DatabaseHealth,
    pub latest_migration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

async fn ping(state: &AppState) -> Result<Duration, sqlx::Error> {
    let started = Instant::now();
    sqlx::query("SELECT 1").execute(&state.db.pool).await?;
    Ok(started.elapsed())
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, ResponseJson<HealthReport>) {
    let started = Instant::now();
    let database = match ping(&state).await {
        Ok(elapsed) => DatabaseHealth {
            connected: true,
            response_time_ms: elapsed.as_millis() as u64,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            DatabaseHealth {
                connected: false,
                response_time_ms: started.elapsed().as_millis() as u64,
                error: (!state.config.is_production()).then(|| e.to_string()),
            }
        }
    };
    let healthy = database.connected;
    let latest_migration = if healthy {
        state.validator.latest_migration().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read the migration history");
            None
        })
    } else {
        None
    };
    let report = HealthReport {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        database,
        latest_migration,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, ResponseJson(report))
}

pub async fn live() -> ResponseJson<ProbeStatus> {
    ResponseJson(ProbeStatus {
        status: "alive",
        detail: None,
    })
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, ResponseJson<ProbeStatus>) {
    let not_ready = |detail: String| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ResponseJson(ProbeStatus {
                status: "not_ready",
                detail: Some(detail),
            }),
        )
    };

    match tokio::time::timeout(READY_TIMEOUT, ping(&state)).await {
        Err(_) => return not_ready("database ping timed out".to_string()),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness database ping failed");
            return not_ready("database unavailable".to_string());
        }
        Ok(Ok(_)) => {}
    }

    match state.validator.validate().await {
        Ok(result) if result.is_ok() => (
            StatusCode::OK,
            ResponseJson(ProbeStatus {
                status: "ready",
                detail: Some(result.summary()),
            }),
        ),
        Ok(result) => not_ready(result.summary()),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness schema validation failed");
            not_ready("schema validation failed".to_string())
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
}

// src/handlers/health.rs

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    config::AppState,
    models::health::{DatabaseHealth, HealthReport, HealthStatus, StatusReport},
};

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    responses(
        (status = 200, description = "Serviço saudável", body = HealthReport),
        (status = 503, description = "Configuração incompleta", body = HealthReport)
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let config = &app_state.config;
    let uptime_seconds = app_state.started_at.elapsed().as_secs();

    let missing = config.missing_env_vars();
    if !missing.is_empty() {
        tracing::warn!("Health check: missing environment variables {:?}", missing);
        let report = HealthReport {
            status: HealthStatus::Unhealthy,
            timestamp: Utc::now(),
            version: config.version.clone(),
            environment: config.environment.clone(),
            error: Some("Missing environment variables"),
            missing,
            database: None,
            uptime_seconds,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(report));
    }

    // Banco fora do ar não derruba o health: só aparece como "disconnected"
    let probe = sqlx::query("SELECT 1").execute(&app_state.db_pool);
    let connected = match tokio::time::timeout(DB_PROBE_TIMEOUT, probe).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::warn!("Health check: database probe failed: {}", e);
            false
        }
        Err(_) => {
            tracing::warn!("Health check: database probe timed out");
            false
        }
    };

    let report = HealthReport {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        version: config.version.clone(),
        environment: config.environment.clone(),
        error: None,
        missing: Vec::new(),
        database: Some(DatabaseHealth {
            status: if connected { "connected" } else { "disconnected" },
            connection: connected,
        }),
        uptime_seconds,
    };
    (StatusCode::OK, Json(report))
}

// HEAD /api/health (monitor de uptime)
pub async fn health_head() -> StatusCode {
    StatusCode::OK
}

// GET /api/status
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "System",
    responses((status = 200, description = "Status operacional", body = StatusReport))
)]
pub async fn status(State(app_state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        status: "operational",
        timestamp: Utc::now(),
        version: app_state.config.version.clone(),
        environment: app_state.config.environment.clone(),
    })
}

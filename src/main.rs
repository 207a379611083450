//src/main.rs

use std::net::SocketAddr;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;


use crate::common::error::init_error_reporting;
use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::{auth::access_guard, security::security_layer};

/// Monta o router completo. As camadas rodam de fora para dentro:
/// trace -> security_layer (política, rate limit, cabeçalhos) -> access_guard (sessão).
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        // --- Sistema ---
        .route(
            "/api/health",
            get(handlers::health::health_check).head(handlers::health::health_head),
        )
        .route("/api/status", get(handlers::health::status))
        // --- Auth ---
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::get_me))
        // --- Pacientes ---
        .route(
            "/api/v1/patients",
            get(handlers::patients::list_patients).post(handlers::patients::create_patient),
        )
        .route(
            "/api/v1/patients/{id}",
            get(handlers::patients::get_patient)
                .put(handlers::patients::update_patient)
                .delete(handlers::patients::delete_patient),
        )
        // --- Agenda ---
        .route(
            "/api/v1/appointments",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/v1/appointments/availability",
            get(handlers::appointments::get_availability),
        )
        // --- API keys ---
        .route(
            "/api/v1/api-keys",
            get(handlers::api_keys::list_api_keys).post(handlers::api_keys::create_api_key),
        )
        // --- Rascunhos de consulta ---
        .route(
            "/api/v1/consultations/{id}/drafts/{section}",
            put(handlers::drafts::put_draft)
                .get(handlers::drafts::get_draft)
                .delete(handlers::drafts::delete_draft),
        )
        .route(
            "/api/v1/consultations/{id}/drafts/{section}/save",
            post(handlers::drafts::save_draft),
        )
        // --- Admin ---
        .route("/api/admin/reset-database", post(handlers::admin::reset_database))
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(access_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), security_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Inicializa o logger (RUST_LOG tem prioridade sobre LOG_LEVEL)
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    init_error_reporting(config.is_production());

    let missing = config.missing_env_vars();
    if !missing.is_empty() {
        tracing::warn!("⚠️ Variáveis ausentes: {:?} (health vai responder 503)", missing);
    }
    if config.service_role_key.is_none() {
        tracing::warn!("SUPABASE_SERVICE_ROLE_KEY não configurada: operações de admin desabilitadas");
    }

    let bind_addr = config.bind_addr;
    tracing::info!("Ambiente: {} (versão {})", config.environment, config.version);

    let app_state = AppState::new(config).await?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao instalar o handler de Ctrl+C: {}", e);
    }
}

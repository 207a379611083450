// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration, time::Instant};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ApiKeyRepository, AppointmentRepository, PatientRepository, PgRecordStore, RecordStore, UserRepository},
    middleware::security::RateLimiter,
    services::{
        api_key_service::ApiKeyService, appointment_service::AppointmentService, auth::AuthService,
        draft_service::DraftRegistry, patient_service::PatientService,
    },
};

// Variáveis que o BaaS exige para o app funcionar
pub const REQUIRED_ENV_VARS: [&str; 2] = ["NEXT_PUBLIC_SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub service_role_key: Option<String>,
    pub environment: String,
    pub bind_addr: SocketAddr,
    // Só com proxy confiável na frente os cabeçalhos de IP valem algo
    pub trust_proxy: bool,
    pub log_level: String,
    pub version: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR format")?;

        Ok(Self {
            database_url,
            supabase_url: non_empty_var("NEXT_PUBLIC_SUPABASE_URL"),
            supabase_anon_key: non_empty_var("NEXT_PUBLIC_SUPABASE_ANON_KEY"),
            service_role_key: non_empty_var("SUPABASE_SERVICE_ROLE_KEY"),
            environment: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),
            bind_addr,
            trust_proxy: env::var("TRUST_PROXY").is_ok_and(|v| matches!(v.trim(), "1" | "true")),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            version: env::var("APP_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn missing_env_vars(&self) -> Vec<&'static str> {
        let present = [self.supabase_url.is_some(), self.supabase_anon_key.is_some()];
        REQUIRED_ENV_VARS
            .iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub patient_service: PatientService,
    pub appointment_service: AppointmentService,
    pub api_key_service: ApiKeyService,
    pub drafts: DraftRegistry,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Pool preguiçosa: o processo sobe (e o /api/health responde)
        // mesmo com o banco fora do ar.
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy(&config.database_url)?;

        tracing::info!("✅ Pool do banco de dados configurada");

        Ok(Self::with_pool(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let record_store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(db_pool.clone()));

        let auth_service = AuthService::new(UserRepository::new(db_pool.clone()), config.is_production());
        let patient_service = PatientService::new(PatientRepository::new(db_pool.clone()));
        let appointment_service = AppointmentService::new(AppointmentRepository::new(db_pool.clone()));
        let api_key_service = ApiKeyService::new(ApiKeyRepository::new(db_pool.clone()));
        let drafts = DraftRegistry::new(record_store);
        drafts.spawn_idle_sweeper();

        Self {
            config: Arc::new(config),
            db_pool,
            auth_service,
            patient_service,
            appointment_service,
            api_key_service,
            drafts,
            rate_limiter: Arc::new(RateLimiter::new()),
            started_at: Instant::now(),
        }
    }
}

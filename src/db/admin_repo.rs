// src/db/admin_repo.rs

use serde_json::Value;
use sqlx::PgPool;

use crate::common::error::AppError;

// Operações privilegiadas (exigem a service role key)
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Chama a função `reset_database()` do banco e devolve o relatório dela.
    pub async fn reset_database(&self) -> Result<Value, AppError> {
        let report: Option<Value> = sqlx::query_scalar("SELECT to_jsonb(reset_database())")
            .fetch_one(&self.pool)
            .await?;
        Ok(report.unwrap_or(Value::Null))
    }
}

// src/db/api_key_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::api_key::ApiKey};

const API_KEY_COLUMNS: &str = r#"
    id, name, description, permissions, is_active, last_used_at, expires_at,
    created_at, key_preview
"#;

pub struct NewApiKey<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub key_hash: &'a str,
    pub key_preview: &'a str,
    pub permissions: Vec<&'static str>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApiKey>, AppError> {
        let sql = format!(
            "SELECT {} FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC",
            API_KEY_COLUMNS
        );
        let keys = sqlx::query_as::<_, ApiKey>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    pub async fn count_active(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_keys WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn insert(&self, key: NewApiKey<'_>) -> Result<ApiKey, AppError> {
        let sql = format!(
            r#"
            INSERT INTO api_keys (
                user_id, name, description, key_hash, key_preview, permissions,
                expires_at, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, true)
            RETURNING {}
            "#,
            API_KEY_COLUMNS
        );

        let created = sqlx::query_as::<_, ApiKey>(&sql)
            .bind(key.user_id)
            .bind(key.name)
            .bind(key.description)
            .bind(key.key_hash)
            .bind(key.key_preview)
            .bind(key.permissions.as_slice())
            .bind(key.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }
}

// src/db/record_store.rs

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{types::Json, PgPool};

use crate::common::{db_utils::checked_ident, error::AppError};

pub type Row = Map<String, Value>;

/// Acesso genérico "linha por chave" ao BaaS, usado pelo auto-save.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(&self, table: &str, key_field: &str, key_value: &str) -> Result<bool, AppError>;

    async fn update(&self, table: &str, key_field: &str, key_value: &str, row: &Row) -> Result<(), AppError>;

    async fn insert(&self, table: &str, row: &Row) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn quoted_columns(row: &Row, skip: Option<&str>) -> Result<Vec<String>, AppError> {
    row.keys()
        .filter(|k| Some(k.as_str()) != skip)
        .map(|k| checked_ident(k).map(|c| format!("\"{}\"", c)))
        .collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn exists(&self, table: &str, key_field: &str, key_value: &str) -> Result<bool, AppError> {
        let sql = format!(
            r#"SELECT EXISTS(SELECT 1 FROM "{}" WHERE "{}"::text = $1)"#,
            checked_ident(table)?,
            checked_ident(key_field)?
        );

        let found: bool = sqlx::query_scalar(&sql)
            .bind(key_value)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn update(&self, table: &str, key_field: &str, key_value: &str, row: &Row) -> Result<(), AppError> {
        let table = checked_ident(table)?;
        let key_field = checked_ident(key_field)?;
        let columns = quoted_columns(row, Some(key_field))?;

        if columns.is_empty() {
            return Ok(());
        }

        // Os valores passam por jsonb_populate_record, então o Postgres
        // converte cada campo para o tipo da coluna.
        let assignments = columns
            .iter()
            .map(|c| format!("{c} = r.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"UPDATE "{table}" SET {assignments}
               FROM jsonb_populate_record(NULL::"{table}", $1) AS r
               WHERE "{table}"."{key_field}"::text = $2"#
        );

        sqlx::query(&sql)
            .bind(Json(row))
            .bind(key_value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), AppError> {
        let table = checked_ident(table)?;
        let columns = quoted_columns(row, None)?.join(", ");

        let sql = format!(
            r#"INSERT INTO "{table}" ({columns})
               SELECT {columns} FROM jsonb_populate_record(NULL::"{table}", $1)"#
        );

        sqlx::query(&sql).bind(Json(row)).execute(&self.pool).await?;
        Ok(())
    }
}

// Store em memória para os testes do auto-save
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::{collections::HashMap, sync::Mutex, time::Duration};

    #[derive(Default)]
    pub struct MemoryRecordStore {
        pub rows: Mutex<HashMap<(String, String), Row>>,
        pub writes: Mutex<Vec<(String, Row)>>,
        pub latency: Option<Duration>,
        pub fail_with: Option<String>,
    }

    impl MemoryRecordStore {
        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        pub fn row(&self, table: &str, key: &str) -> Option<Row> {
            self.rows.lock().unwrap().get(&(table.to_string(), key.to_string())).cloned()
        }

        async fn simulate(&self) -> Result<(), AppError> {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            match &self.fail_with {
                Some(msg) => Err(AppError::InternalServerError(anyhow::anyhow!(msg.clone()))),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl RecordStore for MemoryRecordStore {
        async fn exists(&self, table: &str, _key_field: &str, key_value: &str) -> Result<bool, AppError> {
            self.simulate().await?;
            Ok(self.rows.lock().unwrap().contains_key(&(table.to_string(), key_value.to_string())))
        }

        async fn update(&self, table: &str, _key_field: &str, key_value: &str, row: &Row) -> Result<(), AppError> {
            let mut rows = self.rows.lock().unwrap();
            let stored = rows.entry((table.to_string(), key_value.to_string())).or_default();
            for (k, v) in row {
                stored.insert(k.clone(), v.clone());
            }
            self.writes.lock().unwrap().push(("update".into(), row.clone()));
            Ok(())
        }

        async fn insert(&self, table: &str, row: &Row) -> Result<(), AppError> {
            let key = row
                .get("consultation_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            self.rows.lock().unwrap().insert((table.to_string(), key), row.clone());
            self.writes.lock().unwrap().push(("insert".into(), row.clone()));
            Ok(())
        }
    }
}

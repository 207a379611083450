// src/handlers/admin.rs

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    config::AppState,
    db::AdminRepository,
    middleware::rbac::{AdminOnly, RequireRole},
};

// Tabelas que a função do banco nunca apaga
const PRESERVED_TABLES: [&str; 4] = ["users", "user_profiles", "patients", "medicine_master"];

// POST /api/admin/reset-database
#[utoipa::path(
    post,
    path = "/api/admin/reset-database",
    tag = "Admin",
    responses(
        (status = 200, description = "Reset concluído com resumo"),
        (status = 403, description = "Apenas administradores / service role ausente"),
        (status = 500, description = "Falha na função do banco")
    ),
    security(("session_cookie" = []))
)]
pub async fn reset_database(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
) -> Result<Json<Value>, AppError> {
    if app_state.config.service_role_key.is_none() {
        return Err(AppError::Forbidden(
            "Privileged operations are disabled: SUPABASE_SERVICE_ROLE_KEY is not configured.".into(),
        ));
    }

    tracing::warn!("Database reset requested by admin {}", admin.user().id);

    let report = AdminRepository::new(app_state.db_pool.clone()).reset_database().await?;

    let summary = report.get("summary").cloned().unwrap_or(Value::Null);
    let count = |field: &str| summary.get(field).and_then(Value::as_i64).unwrap_or(0);
    let (tables_reset, total_tables) = (count("successful_tables"), count("total_tables"));

    if count("failed_tables") > 0 {
        tracing::warn!("Database reset: {} tables failed", count("failed_tables"));
    }
    tracing::info!("Database reset completed: {}/{} tables", tables_reset, total_tables);

    Ok(Json(json!({
        "success": true,
        "message": format!("Database reset completed successfully. {}/{} tables reset.", tables_reset, total_tables),
        "data": report,
        "summary": {
            "tables_reset": tables_reset,
            "total_tables": total_tables,
            "rows_deleted": count("total_rows_deleted"),
            "preserved_tables": summary.get("preserved_tables").cloned().unwrap_or_else(|| json!(PRESERVED_TABLES)),
        }
    })))
}

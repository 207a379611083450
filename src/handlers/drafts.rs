// src/handlers/drafts.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    common::{error::AppError, response::DataResponse},
    config::AppState,
    middleware::rbac::{Doctors, RequireRole},
    models::draft::{ConsultationSection, DraftState},
};

// PUT /api/v1/consultations/{id}/drafts/{section}
#[utoipa::path(
    put,
    path = "/api/v1/consultations/{id}/drafts/{section}",
    tag = "Drafts",
    params(
        ("id" = String, Path, description = "ID da consulta"),
        ("section" = ConsultationSection, Path, description = "Seção do formulário")
    ),
    request_body = Value,
    responses(
        (status = 202, description = "Valor aceito; save agendado", body = DraftState),
        (status = 400, description = "Corpo não é um objeto JSON")
    ),
    security(("session_cookie" = []))
)]
pub async fn put_draft(
    State(app_state): State<AppState>,
    _doctor: RequireRole<Doctors>,
    Path((id, section)): Path<(String, ConsultationSection)>,
    Json(value): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let state = app_state.drafts.feed(section, &id, value)?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse::new(state))))
}

// GET /api/v1/consultations/{id}/drafts/{section}
#[utoipa::path(
    get,
    path = "/api/v1/consultations/{id}/drafts/{section}",
    tag = "Drafts",
    params(
        ("id" = String, Path, description = "ID da consulta"),
        ("section" = ConsultationSection, Path, description = "Seção do formulário")
    ),
    responses(
        (status = 200, description = "Estado do auto-save", body = DraftState),
        (status = 404, description = "Nenhum rascunho aberto")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_draft(
    State(app_state): State<AppState>,
    _doctor: RequireRole<Doctors>,
    Path((id, section)): Path<(String, ConsultationSection)>,
) -> Result<Json<DataResponse<DraftState>>, AppError> {
    let state = app_state.drafts.snapshot(section, &id).ok_or(AppError::NotFound("Draft"))?;
    Ok(Json(DataResponse::new(state)))
}

// POST /api/v1/consultations/{id}/drafts/{section}/save
#[utoipa::path(
    post,
    path = "/api/v1/consultations/{id}/drafts/{section}/save",
    tag = "Drafts",
    params(
        ("id" = String, Path, description = "ID da consulta"),
        ("section" = ConsultationSection, Path, description = "Seção do formulário")
    ),
    responses(
        (status = 200, description = "Resultado do save imediato", body = DraftState),
        (status = 404, description = "Nenhum rascunho aberto")
    ),
    security(("session_cookie" = []))
)]
pub async fn save_draft(
    State(app_state): State<AppState>,
    _doctor: RequireRole<Doctors>,
    Path((id, section)): Path<(String, ConsultationSection)>,
) -> Result<Json<DataResponse<DraftState>>, AppError> {
    let state = app_state.drafts.save_now(section, &id).await.ok_or(AppError::NotFound("Draft"))?;
    Ok(Json(DataResponse::new(state)))
}

// DELETE /api/v1/consultations/{id}/drafts/{section}
#[utoipa::path(
    delete,
    path = "/api/v1/consultations/{id}/drafts/{section}",
    tag = "Drafts",
    params(
        ("id" = String, Path, description = "ID da consulta"),
        ("section" = ConsultationSection, Path, description = "Seção do formulário")
    ),
    responses(
        (status = 200, description = "Rascunho fechado"),
        (status = 404, description = "Nenhum rascunho aberto")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_draft(
    State(app_state): State<AppState>,
    _doctor: RequireRole<Doctors>,
    Path((id, section)): Path<(String, ConsultationSection)>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.drafts.discard(section, &id) {
        return Err(AppError::NotFound("Draft"));
    }
    Ok(Json(json!({ "message": "Draft closed" })))
}

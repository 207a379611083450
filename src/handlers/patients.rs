// src/handlers/patients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, response::DataResponse},
    config::AppState,
    middleware::rbac::{ClinicalStaff, RequireRole},
    models::patient::{CreatePatientPayload, Patient, PatientListQuery, PatientPage, UpdatePatientPayload},
};

// GET /api/v1/patients
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    tag = "Patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "Página de pacientes", body = PatientPage),
        (status = 400, description = "Parâmetros inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_patients(
    State(app_state): State<AppState>,
    _staff: RequireRole<ClinicalStaff>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<PatientPage>, AppError> {
    query.validate()?;
    let page = app_state.patient_service.list_patients(query).await?;
    Ok(Json(page))
}

// POST /api/v1/patients
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    tag = "Patients",
    request_body = CreatePatientPayload,
    responses(
        (status = 201, description = "Paciente cadastrado", body = Patient),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_patient(
    State(app_state): State<AppState>,
    _staff: RequireRole<ClinicalStaff>,
    Json(payload): Json<CreatePatientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let patient = app_state.patient_service.create_patient(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(patient, "Patient created successfully")),
    ))
}

// GET /api/v1/patients/{id}
#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    tag = "Patients",
    params(("id" = String, Path, description = "ID do paciente")),
    responses(
        (status = 200, description = "Paciente", body = Patient),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_patient(
    State(app_state): State<AppState>,
    _staff: RequireRole<ClinicalStaff>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Patient>>, AppError> {
    let patient = app_state.patient_service.get_patient(&id).await?;
    Ok(Json(DataResponse::new(patient)))
}

// PUT /api/v1/patients/{id}
#[utoipa::path(
    put,
    path = "/api/v1/patients/{id}",
    tag = "Patients",
    params(("id" = String, Path, description = "ID do paciente")),
    request_body = UpdatePatientPayload,
    responses(
        (status = 200, description = "Paciente atualizado", body = Patient),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_patient(
    State(app_state): State<AppState>,
    _staff: RequireRole<ClinicalStaff>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePatientPayload>,
) -> Result<Json<DataResponse<Patient>>, AppError> {
    payload.validate()?;
    let patient = app_state.patient_service.update_patient(&id, payload).await?;
    Ok(Json(DataResponse::with_message(patient, "Patient updated successfully")))
}

// DELETE /api/v1/patients/{id} (exclusão lógica)
#[utoipa::path(
    delete,
    path = "/api/v1/patients/{id}",
    tag = "Patients",
    params(("id" = String, Path, description = "ID do paciente")),
    responses(
        (status = 200, description = "Paciente desativado"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Paciente com atendimento em aberto")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_patient(
    State(app_state): State<AppState>,
    _staff: RequireRole<ClinicalStaff>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.patient_service.deactivate_patient(&id).await?;
    Ok(Json(json!({ "message": "Patient deleted successfully" })))
}

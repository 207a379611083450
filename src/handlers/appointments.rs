// src/handlers/appointments.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, response::DataResponse},
    config::AppState,
    middleware::rbac::{FrontDesk, RequireRole},
    models::appointment::{
        Appointment, AppointmentListQuery, AppointmentPage, AvailabilityQuery, AvailabilitySlot,
        CreateAppointmentPayload,
    },
};

// GET /api/v1/appointments
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    tag = "Appointments",
    params(AppointmentListQuery),
    responses((status = 200, description = "Página de consultas", body = AppointmentPage)),
    security(("session_cookie" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    _desk: RequireRole<FrontDesk>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<AppointmentPage>, AppError> {
    query.validate()?;
    let page = app_state.appointment_service.list_appointments(query).await?;
    Ok(Json(page))
}

// POST /api/v1/appointments
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentPayload,
    responses(
        (status = 201, description = "Consulta marcada", body = Appointment),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Horário indisponível")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    desk: RequireRole<FrontDesk>,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let appointment = app_state.appointment_service.book(payload, desk.user().id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(appointment, "Appointment created successfully")),
    ))
}

// GET /api/v1/appointments/availability
#[utoipa::path(
    get,
    path = "/api/v1/appointments/availability",
    tag = "Appointments",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots do dia, em ordem", body = [AvailabilitySlot]),
        (status = 400, description = "Parâmetros inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_availability(
    State(app_state): State<AppState>,
    _desk: RequireRole<FrontDesk>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DataResponse<Vec<AvailabilitySlot>>>, AppError> {
    query.validate()?;
    let slots = app_state
        .appointment_service
        .availability(query.doctor_id, query.date, query.duration, query.available_only)
        .await?;
    Ok(Json(DataResponse::new(slots)))
}

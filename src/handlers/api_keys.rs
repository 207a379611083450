// src/handlers/api_keys.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{error::AppError, response::DataResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::api_key::{ApiKeyView, CreateApiKeyPayload, CreatedApiKey},
};

// GET /api/v1/api-keys
#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    responses((status = 200, description = "Chaves do usuário", body = [ApiKeyView])),
    security(("session_cookie" = []))
)]
pub async fn list_api_keys(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<DataResponse<Vec<ApiKeyView>>>, AppError> {
    let keys = app_state.api_key_service.list_keys(user.id).await?;
    Ok(Json(DataResponse::new(keys)))
}

// POST /api/v1/api-keys
#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    request_body = CreateApiKeyPayload,
    responses(
        (status = 201, description = "Chave criada; o valor completo só aparece aqui", body = CreatedApiKey),
        (status = 400, description = "Dados inválidos ou limite de chaves atingido")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_api_key(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateApiKeyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.api_key_service.create_key(user.id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            created,
            "API key created successfully. Store it now: it will not be shown again.",
        )),
    ))
}

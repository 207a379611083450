// src/handlers/auth.rs

use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, response::DataResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{LoginResponse, LoginUserPayload},
        session::UserProfile,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Sessão criada (cookies definidos)", body = LoginResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Credenciais inválidas ou conta inativa"),
        (status = 429, description = "Muitas tentativas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let profile = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    let jar = app_state.auth_service.start_session(jar, &profile)?;
    tracing::info!(
        "User {} logged in as {}",
        profile.id,
        profile.role.map(|r| r.display_name()).unwrap_or("(no role)")
    );

    let response = LoginResponse {
        redirect_to: profile.role.map(|r| r.dashboard_path()),
        data: profile,
        message: "Login successful",
    };
    Ok((jar, Json(response)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookies de sessão removidos")),
    security(("session_cookie" = []))
)]
pub async fn logout(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (app_state.auth_service.end_session(jar), Json(json!({ "message": "Logged out" })))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Perfil da sessão atual", body = UserProfile),
        (status = 401, description = "Não autenticado")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<DataResponse<UserProfile>> {
    Json(DataResponse::new(user))
}

// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::{
    common::error::AppError,
    middleware::routes::{classify, RoutePolicy},
    models::session::UserProfile,
    services::session_codec::{clear_session_cookies, decode_jar, SessionError},
};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

// O middleware em si. Nunca devolve erro: ou deixa passar, ou redireciona.
pub async fn access_guard(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let policy = request
        .extensions()
        .get::<RoutePolicy>()
        .copied()
        .unwrap_or_else(|| classify(request.uri().path()));

    if policy.is_public {
        return next.run(request).await;
    }

    let now = Utc::now().timestamp_millis();

    match decode_jar(&jar, now) {
        Ok(decoded) => {
            let user = decoded.user;

            if user.role.is_none() || !user.is_active {
                tracing::info!(
                    "Access denied for user {} on {}: role={:?} active={}",
                    user.id,
                    request.uri().path(),
                    user.role,
                    user.is_active
                );
                return Redirect::temporary(UNAUTHORIZED_PATH).into_response();
            }

            tracing::debug!(
                "Access granted: user={} bucket={} path={}",
                user.id,
                policy.bucket.as_str(),
                request.uri().path()
            );

            // Insere o usuário nos "extensions" da requisição
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(err) => {
            match &err {
                SessionError::Missing => {
                    tracing::debug!("No session cookies on {}", request.uri().path())
                }
                SessionError::Malformed(reason) => {
                    tracing::info!("Session validation error: {}", reason)
                }
                SessionError::Expired => tracing::info!("Session expired"),
            }

            // Limpa cookies velhos/inválidos junto com o redirect
            (clear_session_cookies(jar), Redirect::temporary(LOGIN_PATH)).into_response()
        }
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserProfile);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

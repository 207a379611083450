// src/common/error.rs

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Definido uma única vez no boot (NODE_ENV). Em produção os detalhes
// dos erros internos nunca vão para o cliente.
static EXPOSE_INTERNAL_DETAILS: OnceLock<bool> = OnceLock::new();

pub fn init_error_reporting(is_production: bool) {
    let _ = EXPOSE_INTERNAL_DETAILS.set(!is_production);
}

fn expose_internal_details() -> bool {
    *EXPOSE_INTERNAL_DETAILS.get().unwrap_or(&false)
}

// Erro de fronteira HTTP. Todo handler devolve Result<_, AppError>,
// então nenhuma falha chega ao cliente como stack trace.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited {
        message: &'static str,
        retry_after_secs: u64,
    },

    // Falha do banco (o Postgres do BaaS)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated
            | AppError::InvalidCredentials
            | AppError::AccountInactive => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseError(_)
            | AppError::BcryptError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({ "error": "One or more fields are invalid.", "details": details })
            }
            AppError::InvalidInput(message) => json!({ "error": message }),
            AppError::Unauthenticated => json!({ "error": "Authentication required" }),
            AppError::InvalidCredentials => json!({ "error": "Invalid email or password" }),
            AppError::AccountInactive => json!({ "error": "Account is inactive" }),
            AppError::Forbidden(message) => json!({ "error": "Insufficient permissions", "details": message }),
            AppError::NotFound(what) => json!({ "error": format!("{} not found", what) }),
            AppError::Conflict(message) => json!({ "error": message }),
            AppError::RateLimited { message, retry_after_secs } => {
                let body = Json(json!({ "error": message }));
                return (
                    status,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    body,
                )
                    .into_response();
            }

            // Todo o resto vira 500. O detalhe vai para o log; o cliente
            // só vê a mensagem genérica (e o detalhe fora de produção).
            ref e => {
                tracing::error!("Internal server error: {}", e);
                if expose_internal_details() {
                    json!({ "error": "Internal server error", "details": e.to_string() })
                } else {
                    json!({ "error": "Internal server error" })
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

// Erro do auto-save: vira estado do coordenador, nunca é propagado.
#[derive(Debug, Clone, Error)]
pub enum SaveError {
    #[error("{0}")]
    Store(String),

    #[error("Failed to serialize value: {0}")]
    Serialize(String),

    #[error("{0}")]
    Handler(String),
}

impl From<AppError> for SaveError {
    fn from(err: AppError) -> Self {
        SaveError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        SaveError::Serialize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 2, message = "too short"))]
        name: String,
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Patient").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("dup".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_error_is_bad_request() {
        let errors = Payload { name: "a".into() }.validate().unwrap_err();
        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { message: "slow down", retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn save_error_keeps_store_message() {
        let err: SaveError = AppError::Conflict("row locked".into()).into();
        assert_eq!(err.to_string(), "Conflict: row locked");
    }
}

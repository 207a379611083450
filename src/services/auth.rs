// src/services/auth.rs

use axum_extra::extract::cookie::CookieJar;
use bcrypt::verify;
use chrono::Utc;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::session::{Session, UserProfile},
    services::session_codec::{clear_session_cookies, session_cookies},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, secure_cookies: bool) -> Self {
        Self { user_repo, secure_cookies }
    }

    /// Confere e-mail/senha e devolve o perfil que vai para o cookie.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<UserProfile, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Contas criadas só pelo BaaS não têm hash local
        let Some(password_hash) = user.password_hash.clone() else {
            return Err(AppError::InvalidCredentials);
        };

        let password_clone = password.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!("Login refused for inactive account {}", user.id);
            return Err(AppError::AccountInactive);
        }

        Ok(user.profile())
    }

    /// Emite os dois cookies de sessão a partir de agora.
    pub fn start_session(&self, jar: CookieJar, profile: &UserProfile) -> Result<CookieJar, AppError> {
        let session = Session::issued_at(Utc::now().timestamp_millis());
        let jar = session_cookies(jar, &session, profile, self.secure_cookies)
            .map_err(|e| anyhow::anyhow!("Failed to encode session cookie: {}", e))?;
        Ok(jar)
    }

    pub fn end_session(&self, jar: CookieJar) -> CookieJar {
        clear_session_cookies(jar)
    }
}

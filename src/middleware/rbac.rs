// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::session::{Role, UserProfile},
};

/// 1. O Trait que define um conjunto de papéis permitidos
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
    fn label() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub UserProfile, PhantomData<T>);

impl<T> RequireRole<T> {
    pub fn user(&self) -> &UserProfile {
        &self.0
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (colocado pelo access_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::Unauthenticated)?;

        // B. Confere o papel
        if !user.0.has_role(T::allowed()) {
            return Err(AppError::Forbidden(format!("This action requires the {} role set.", T::label())));
        }

        Ok(RequireRole(user.0.clone(), PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleSet for AdminOnly {
    fn allowed() -> &'static [Role] { &[Role::Admin] }
    fn label() -> &'static str { "admin" }
}

pub struct ClinicalStaff;
impl RoleSet for ClinicalStaff {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Doctor, Role::Receptionist] }
    fn label() -> &'static str { "clinical staff" }
}

pub struct FrontDesk;
impl RoleSet for FrontDesk {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Receptionist, Role::Doctor] }
    fn label() -> &'static str { "front desk" }
}

pub struct Doctors;
impl RoleSet for Doctors {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Doctor] }
    fn label() -> &'static str { "doctor" }
}

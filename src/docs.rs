// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- System ---
        handlers::health::health_check,
        handlers::health::status,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Patients ---
        handlers::patients::list_patients,
        handlers::patients::create_patient,
        handlers::patients::get_patient,
        handlers::patients::update_patient,
        handlers::patients::delete_patient,

        // --- Appointments ---
        handlers::appointments::list_appointments,
        handlers::appointments::create_appointment,
        handlers::appointments::get_availability,

        // --- API Keys ---
        handlers::api_keys::list_api_keys,
        handlers::api_keys::create_api_key,

        // --- Drafts ---
        handlers::drafts::put_draft,
        handlers::drafts::get_draft,
        handlers::drafts::save_draft,
        handlers::drafts::delete_draft,

        // --- Admin ---
        handlers::admin::reset_database,
    ),
    components(
        schemas(
            // --- Sessão ---
            models::session::Role,
            models::session::UserProfile,
            models::auth::LoginUserPayload,
            models::auth::LoginResponse,

            // --- Health ---
            models::health::HealthStatus,
            models::health::HealthReport,
            models::health::DatabaseHealth,
            models::health::StatusReport,

            // --- Patients ---
            models::patient::Gender,
            models::patient::BloodGroup,
            models::patient::Patient,
            models::patient::CreatePatientPayload,
            models::patient::UpdatePatientPayload,
            models::patient::PatientPage,

            // --- Appointments ---
            models::appointment::AppointmentStatus,
            models::appointment::AppointmentType,
            models::appointment::Appointment,
            models::appointment::CreateAppointmentPayload,
            models::appointment::AppointmentPage,
            models::appointment::AvailabilitySlot,
            models::appointment::AvailabilityCheck,

            // --- API Keys ---
            models::api_key::ApiKeyPermission,
            models::api_key::ApiKeyStatus,
            models::api_key::ApiKey,
            models::api_key::ApiKeyView,
            models::api_key::CreateApiKeyPayload,
            models::api_key::CreatedApiKey,

            // --- Drafts ---
            models::draft::ConsultationSection,
            models::draft::DraftState,
            services::autosave::SaveStatus,
            services::autosave::SaveSnapshot,
        )
    ),
    tags(
        (name = "System", description = "Health e status"),
        (name = "Auth", description = "Login, logout e sessão"),
        (name = "Patients", description = "Cadastro de pacientes"),
        (name = "Appointments", description = "Agenda e disponibilidade dos médicos"),
        (name = "API Keys", description = "Chaves de integração"),
        (name = "Drafts", description = "Rascunhos de consulta com auto-save"),
        (name = "Admin", description = "Operações privilegiadas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                crate::models::session::SESSION_COOKIE,
            ))),
        );
    }
}

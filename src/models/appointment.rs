// src/models/appointment.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::db_utils::Pagination;

pub const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    // Status que não ocupam mais a agenda do médico
    pub const RELEASED: [AppointmentStatus; 3] = [
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Completed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Procedure,
    Emergency,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::FollowUp => "follow_up",
            AppointmentType::Procedure => "procedure",
            AppointmentType::Emergency => "emergency",
        }
    }
}

// Linha da tabela `appointments`
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor_id: Uuid,
    #[schema(value_type = String)]
    pub scheduled_date: NaiveDate,
    #[schema(value_type = String)]
    pub scheduled_time: NaiveTime,
    pub duration: Option<i32>,
    pub status: String,
    pub appointment_type: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentPayload {
    #[validate(length(min = 1, message = "Patient is required."))]
    pub patient_id: String,

    pub doctor_id: Uuid,

    #[schema(value_type = String, example = "2026-10-20")]
    pub scheduled_date: NaiveDate,

    #[schema(value_type = String, example = "10:30:00")]
    pub scheduled_time: NaiveTime,

    #[validate(range(min = 15, max = 240, message = "Duration must be between 15 and 240 minutes."))]
    pub duration: Option<u32>,

    pub appointment_type: AppointmentType,

    #[validate(length(max = 200, message = "Title is too long."))]
    pub title: Option<String>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    #[validate(range(min = 1, message = "Page must be at least 1."))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100."))]
    pub limit: Option<i64>,

    pub doctor_id: Option<Uuid>,

    #[param(value_type = Option<String>)]
    pub date: Option<NaiveDate>,

    #[param(value_type = Option<String>)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentPage {
    pub data: Vec<Appointment>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub doctor_id: Uuid,

    #[param(value_type = String, example = "2026-10-20")]
    pub date: NaiveDate,

    #[validate(range(min = 15, max = 240, message = "Duration must be between 15 and 240 minutes."))]
    pub duration: Option<u32>,

    // Só os slots livres (o padrão devolve todos, com o motivo dos ocupados)
    #[serde(default)]
    pub available_only: bool,
}

// Linha de `doctor_availability` (um registro por dia da semana)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DoctorSchedule {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start_time: Option<NaiveTime>,
    pub break_end_time: Option<NaiveTime>,
    pub buffer_time: Option<i32>,
    pub max_appointments: Option<i32>,
}

// Linha de `doctor_leaves` (já filtrada: aprovada e cobrindo a data)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DoctorLeave {
    pub leave_type: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

// Intervalo ocupado da agenda do dia
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookedAppointment {
    pub scheduled_time: NaiveTime,
    pub duration: Option<i32>,
}

/// Slot derivado, recalculado a cada consulta. Nunca persistido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AvailabilitySlot {
    #[serde(serialize_with = "hh_mm")]
    #[schema(value_type = String, example = "09:30")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "hh_mm")]
    #[schema(value_type = String, example = "10:00")]
    pub end_time: NaiveTime,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

fn hh_mm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

// src/services/appointment_service.rs

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{
    common::{db_utils::Pagination, error::AppError},
    db::{appointment_repo::AppointmentFilter, AppointmentRepository},
    models::appointment::{
        Appointment, AppointmentListQuery, AppointmentPage, AvailabilitySlot, CreateAppointmentPayload,
        DEFAULT_APPOINTMENT_MINUTES,
    },
    services::availability::{available_slots, check_slot, compute_slots, DayAgenda},
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Clone)]
pub struct AppointmentService {
    repo: AppointmentRepository,
}

impl AppointmentService {
    pub fn new(repo: AppointmentRepository) -> Self {
        Self { repo }
    }

    /// Carrega o dia do médico: horário, licenças e consultas ativas.
    pub async fn day_agenda(&self, doctor_id: Uuid, date: NaiveDate) -> Result<DayAgenda, AppError> {
        let day_of_week = date.weekday().num_days_from_sunday() as i32;

        let Some(schedule) = self.repo.find_schedule(doctor_id, day_of_week).await? else {
            return Ok(DayAgenda::default());
        };

        let leaves = self.repo.list_leaves(doctor_id, date).await?;
        let booked = self.repo.list_booked(doctor_id, date).await?;

        Ok(DayAgenda {
            hours: Some(schedule.into()),
            leaves: leaves.into_iter().map(Into::into).collect(),
            booked: booked.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration: Option<u32>,
        available_only: bool,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        let agenda = self.day_agenda(doctor_id, date).await?;
        let duration = duration.unwrap_or(DEFAULT_APPOINTMENT_MINUTES);

        // Recalculado a cada pedido; a agenda muda demais para cache
        Ok(if available_only {
            available_slots(&agenda, duration)
        } else {
            compute_slots(&agenda, duration)
        })
    }

    pub async fn list_appointments(&self, query: AppointmentListQuery) -> Result<AppointmentPage, AppError> {
        let page = query.page.unwrap_or(1);
        let per_page = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let filter = AppointmentFilter { doctor_id: query.doctor_id, date: query.date, status: query.status };

        let (data, total) = self.repo.list(&filter, per_page, Pagination::offset(page, per_page)?).await?;

        Ok(AppointmentPage { data, pagination: Pagination::new(page, per_page, total) })
    }

    /// Marca uma consulta depois de validar o horário contra a agenda do dia.
    pub async fn book(&self, payload: CreateAppointmentPayload, created_by: Uuid) -> Result<Appointment, AppError> {
        let duration = payload.duration.unwrap_or(DEFAULT_APPOINTMENT_MINUTES);
        let agenda = self.day_agenda(payload.doctor_id, payload.scheduled_date).await?;

        let check = check_slot(&agenda, payload.scheduled_time, duration);
        if !check.available {
            tracing::info!(
                "Booking refused for doctor {} on {} at {}: {}",
                payload.doctor_id,
                payload.scheduled_date,
                payload.scheduled_time,
                check.message
            );
            let detail = if check.conflicts.is_empty() {
                check.message
            } else {
                format!("{}: {}", check.message, check.conflicts.join("; "))
            };
            return Err(AppError::Conflict(detail));
        }

        let appointment = self.repo.create(&payload, duration, created_by).await?;
        tracing::info!("Appointment {} booked by {}", appointment.id, created_by);
        Ok(appointment)
    }
}

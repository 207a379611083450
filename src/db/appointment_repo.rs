// src/db/appointment_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::appointment::{
        Appointment, AppointmentStatus, BookedAppointment, CreateAppointmentPayload, DoctorLeave,
        DoctorSchedule,
    },
};

const APPOINTMENT_COLUMNS: &str = r#"
    id, patient_id, doctor_id, scheduled_date, scheduled_time, duration, status,
    appointment_type, title, notes, created_by, created_at
"#;

#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

fn released_statuses() -> Vec<&'static str> {
    AppointmentStatus::RELEASED.iter().map(|s| s.as_str()).collect()
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  AGENDA DO MÉDICO
    // =========================================================================

    /// Horário de atendimento para o dia da semana (domingo = 0)
    pub async fn find_schedule(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Option<DoctorSchedule>, AppError> {
        let schedule = sqlx::query_as::<_, DoctorSchedule>(
            r#"
            SELECT start_time, end_time, break_start_time, break_end_time,
                   buffer_time, max_appointments
            FROM doctor_availability
            WHERE doctor_id = $1 AND day_of_week = $2 AND is_available = true
            LIMIT 1
            "#,
        )
        .bind(doctor_id)
        .bind(day_of_week)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    /// Licenças aprovadas que cobrem a data
    pub async fn list_leaves(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<DoctorLeave>, AppError> {
        let leaves = sqlx::query_as::<_, DoctorLeave>(
            r#"
            SELECT leave_type, start_time, end_time
            FROM doctor_leaves
            WHERE doctor_id = $1 AND approved = true
              AND start_date <= $2 AND end_date >= $2
            "#,
        )
        .bind(doctor_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(leaves)
    }

    /// Consultas que ainda ocupam a agenda do dia
    pub async fn list_booked(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<BookedAppointment>, AppError> {
        let booked = sqlx::query_as::<_, BookedAppointment>(
            r#"
            SELECT scheduled_time, duration
            FROM appointments
            WHERE doctor_id = $1 AND scheduled_date = $2
              AND NOT (status = ANY($3))
            ORDER BY scheduled_time ASC
            "#,
        )
        .bind(doctor_id)
        .bind(date)
        .bind(released_statuses())
        .fetch_all(&self.pool)
        .await?;
        Ok(booked)
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list(
        &self,
        filter: &AppointmentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Appointment>, i64), AppError> {
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR doctor_id = $1)
              AND ($2::date IS NULL OR scheduled_date = $2)
              AND ($3::text IS NULL OR status = $3)
        "#;
        let status = filter.status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {} FROM appointments {} ORDER BY scheduled_date ASC, scheduled_time ASC LIMIT $4 OFFSET $5",
            APPOINTMENT_COLUMNS, where_clause
        );

        let appointments = sqlx::query_as::<_, Appointment>(&sql)
            .bind(filter.doctor_id)
            .bind(filter.date)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM appointments {}", where_clause))
            .bind(filter.doctor_id)
            .bind(filter.date)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok((appointments, total))
    }

    pub async fn create(
        &self,
        payload: &CreateAppointmentPayload,
        duration: u32,
        created_by: Uuid,
    ) -> Result<Appointment, AppError> {
        let sql = format!(
            r#"
            INSERT INTO appointments (
                patient_id, doctor_id, scheduled_date, scheduled_time, duration,
                status, appointment_type, title, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );

        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(&payload.patient_id)
            .bind(payload.doctor_id)
            .bind(payload.scheduled_date)
            .bind(payload.scheduled_time)
            .bind(duration as i32)
            .bind(AppointmentStatus::Scheduled.as_str())
            .bind(payload.appointment_type.as_str())
            .bind(&payload.title)
            .bind(&payload.notes)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::InvalidInput("Unknown patient or doctor.".into());
                    }
                }
                e.into()
            })?;

        Ok(appointment)
    }
}

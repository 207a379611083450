// src/db/patient_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::patient::{
        CreatePatientPayload, Gender, Patient, PatientSort, SortOrder, UpdatePatientPayload,
    },
};

const PATIENT_COLUMNS: &str = r#"
    patient_id, full_name, phone, email, date_of_birth, gender, address,
    emergency_contact_name, emergency_contact_phone, blood_group, allergies,
    medical_history, is_active, created_at, updated_at
"#;

// Status de atendimento que ainda "seguram" o paciente
pub const ACTIVE_VISIT_STATUSES: [&str; 3] = ["waiting", "consultation", "procedures_pending"];

#[derive(Debug, Default, Clone)]
pub struct PatientFilter {
    pub search: Option<String>,
    pub gender: Option<Gender>,
    pub sort: PatientSort,
    pub order: SortOrder,
}

#[derive(Clone)]
pub struct PatientRepository {
    pool: PgPool,
}

// Telefone duplicado vira 409; o resto sobe como erro de banco
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.message().contains("phone") {
            return AppError::Conflict("A patient with this phone number already exists".into());
        }
    }
    e.into()
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &PatientFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Patient>, i64), AppError> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.trim()));
        let gender = filter.gender.map(|g| g.as_str());

        let where_clause = r#"
            WHERE ($1::text IS NULL OR full_name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1)
              AND ($2::text IS NULL OR gender = $2)
        "#;

        // Coluna e direção vêm de enums fechados, nunca do cliente
        let sql = format!(
            "SELECT {} FROM patients {} ORDER BY {} {} NULLS LAST LIMIT $3 OFFSET $4",
            PATIENT_COLUMNS,
            where_clause,
            filter.sort.column(),
            filter.order.keyword()
        );

        let patients = sqlx::query_as::<_, Patient>(&sql)
            .bind(&pattern)
            .bind(gender)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM patients {}", where_clause))
            .bind(&pattern)
            .bind(gender)
            .fetch_one(&self.pool)
            .await?;

        Ok((patients, total))
    }

    pub async fn find(&self, patient_id: &str) -> Result<Option<Patient>, AppError> {
        let sql = format!("SELECT {} FROM patients WHERE patient_id = $1", PATIENT_COLUMNS);
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    pub async fn create(&self, payload: &CreatePatientPayload) -> Result<Patient, AppError> {
        let sql = format!(
            r#"
            INSERT INTO patients (
                full_name, phone, email, date_of_birth, gender, address,
                emergency_contact_name, emergency_contact_phone, blood_group,
                allergies, medical_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );

        sqlx::query_as::<_, Patient>(&sql)
            .bind(&payload.full_name)
            .bind(&payload.phone)
            .bind(&payload.email)
            .bind(payload.date_of_birth)
            .bind(payload.gender.as_str())
            .bind(&payload.address)
            .bind(&payload.emergency_contact_name)
            .bind(&payload.emergency_contact_phone)
            .bind(payload.blood_group.map(|b| b.as_str()))
            .bind(&payload.allergies)
            .bind(&payload.medical_history)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    // Atualização parcial: COALESCE mantém o valor atual quando o campo não veio
    pub async fn update(
        &self,
        patient_id: &str,
        payload: &UpdatePatientPayload,
    ) -> Result<Option<Patient>, AppError> {
        let sql = format!(
            r#"
            UPDATE patients SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                date_of_birth = COALESCE($5, date_of_birth),
                gender = COALESCE($6, gender),
                address = COALESCE($7, address),
                emergency_contact_name = COALESCE($8, emergency_contact_name),
                emergency_contact_phone = COALESCE($9, emergency_contact_phone),
                blood_group = COALESCE($10, blood_group),
                allergies = COALESCE($11, allergies),
                medical_history = COALESCE($12, medical_history),
                updated_at = NOW()
            WHERE patient_id = $1
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );

        sqlx::query_as::<_, Patient>(&sql)
            .bind(patient_id)
            .bind(&payload.full_name)
            .bind(&payload.phone)
            .bind(&payload.email)
            .bind(payload.date_of_birth)
            .bind(payload.gender.map(|g| g.as_str()))
            .bind(&payload.address)
            .bind(&payload.emergency_contact_name)
            .bind(&payload.emergency_contact_phone)
            .bind(payload.blood_group.map(|b| b.as_str()))
            .bind(&payload.allergies)
            .bind(&payload.medical_history)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    pub async fn has_active_visits(&self, patient_id: &str) -> Result<bool, AppError> {
        let active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM opd_records
                WHERE patient_id = $1 AND opd_status = ANY($2)
            )
            "#,
        )
        .bind(patient_id)
        .bind(&ACTIVE_VISIT_STATUSES[..])
        .fetch_one(&self.pool)
        .await?;
        Ok(active)
    }

    // Exclusão lógica
    pub async fn deactivate(&self, patient_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE patients SET is_active = false, updated_at = NOW() WHERE patient_id = $1",
        )
        .bind(patient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

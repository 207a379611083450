// src/services/patient_service.rs

use crate::{
    common::{db_utils::Pagination, error::AppError},
    db::{patient_repo::PatientFilter, PatientRepository},
    models::patient::{CreatePatientPayload, Patient, PatientListQuery, PatientPage, UpdatePatientPayload},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct PatientService {
    repo: PatientRepository,
}

impl PatientService {
    pub fn new(repo: PatientRepository) -> Self {
        Self { repo }
    }

    pub async fn list_patients(&self, query: PatientListQuery) -> Result<PatientPage, AppError> {
        let page = query.page.unwrap_or(1);
        let per_page = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        let filter = PatientFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            gender: query.gender,
            sort: query.sort.unwrap_or_default(),
            order: query.order.unwrap_or_default(),
        };

        let (data, total) = self.repo.list(&filter, per_page, Pagination::offset(page, per_page)?).await?;

        Ok(PatientPage { data, pagination: Pagination::new(page, per_page, total) })
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, AppError> {
        self.repo.find(patient_id).await?.ok_or(AppError::NotFound("Patient"))
    }

    pub async fn create_patient(&self, payload: CreatePatientPayload) -> Result<Patient, AppError> {
        let patient = self.repo.create(&payload).await?;
        tracing::info!("Patient {} registered", patient.patient_id);
        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        payload: UpdatePatientPayload,
    ) -> Result<Patient, AppError> {
        self.repo
            .update(patient_id, &payload)
            .await?
            .ok_or(AppError::NotFound("Patient"))
    }

    /// Exclusão lógica, recusada enquanto houver atendimento em aberto.
    pub async fn deactivate_patient(&self, patient_id: &str) -> Result<(), AppError> {
        if self.repo.find(patient_id).await?.is_none() {
            return Err(AppError::NotFound("Patient"));
        }

        if self.repo.has_active_visits(patient_id).await? {
            return Err(AppError::Conflict(
                "Cannot delete patient with active OPD visits. Please complete or cancel them first.".into(),
            ));
        }

        if !self.repo.deactivate(patient_id).await? {
            return Err(AppError::NotFound("Patient"));
        }

        tracing::info!("Patient {} deactivated", patient_id);
        Ok(())
    }
}

// src/models/draft.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::autosave::SaveSnapshot;

pub const DRAFT_KEY_FIELD: &str = "consultation_id";

/// Seções do formulário de consulta que salvam sozinhas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationSection {
    Vitals,
    History,
    ChiefComplaints,
    Examination,
    Diagnosis,
    Investigations,
    TreatmentPlan,
}

impl ConsultationSection {
    pub fn table(&self) -> &'static str {
        match self {
            ConsultationSection::Vitals => "consultation_vitals",
            ConsultationSection::History => "consultation_history",
            ConsultationSection::ChiefComplaints => "consultation_chief_complaints",
            ConsultationSection::Examination => "examination_data",
            ConsultationSection::Diagnosis => "consultation_diagnoses",
            ConsultationSection::Investigations => "consultation_investigations",
            ConsultationSection::TreatmentPlan => "consultation_treatment_plans",
        }
    }
}

// Resposta das rotas de rascunho: valor atual + estado do auto-save
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DraftState {
    pub section: ConsultationSection,
    pub consultation_id: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    #[serde(flatten)]
    pub snapshot: SaveSnapshot,
}

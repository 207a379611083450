// src/models/patient.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::db_utils::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

// Linha da tabela `patients`
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Patient {
    pub patient_id: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePatientPayload {
    #[validate(length(min = 2, max = 100, message = "Full name must have 2 to 100 characters."))]
    #[schema(example = "Asha Verma")]
    pub full_name: String,

    #[validate(length(min = 10, max = 15, message = "Phone must have 10 to 15 characters."))]
    #[schema(example = "9876543210")]
    pub phone: String,

    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,

    #[schema(value_type = String, example = "1990-04-12")]
    pub date_of_birth: NaiveDate,

    pub gender: Gender,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePatientPayload {
    #[validate(length(min = 2, max = 100, message = "Full name must have 2 to 100 characters."))]
    pub full_name: Option<String>,

    #[validate(length(min = 10, max = 15, message = "Phone must have 10 to 15 characters."))]
    pub phone: Option<String>,

    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,

    #[schema(value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,

    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatientSort {
    #[default]
    CreatedAt,
    FullName,
    DateOfBirth,
}

impl PatientSort {
    pub fn column(&self) -> &'static str {
        match self {
            PatientSort::CreatedAt => "created_at",
            PatientSort::FullName => "full_name",
            PatientSort::DateOfBirth => "date_of_birth",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    #[validate(range(min = 1, message = "Page must be at least 1."))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100."))]
    pub limit: Option<i64>,

    pub search: Option<String>,

    #[param(value_type = Option<String>)]
    pub gender: Option<Gender>,

    #[param(value_type = Option<String>)]
    pub sort: Option<PatientSort>,

    #[param(value_type = Option<String>)]
    pub order: Option<SortOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientPage {
    pub data: Vec<Patient>,
    pub pagination: Pagination,
}

// src/models/session.rs

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "swamicare_session";
pub const USER_COOKIE: &str = "swamicare_user";

// 24 horas
pub const SESSION_DURATION_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Papéis do sistema. Enum fechado: um papel novo quebra os `match`
/// exaustivos em tempo de compilação em vez de virar rota `undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    ServiceAttendant,
    Pharmacist,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::ServiceAttendant => "service_attendant",
            Role::Pharmacist => "pharmacist",
            Role::Patient => "patient",
        }
    }

    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Doctor => "/doctor/dashboard",
            Role::Receptionist => "/receptionist/dashboard",
            Role::ServiceAttendant => "/attendant/dashboard",
            Role::Pharmacist => "/pharmacy/dashboard",
            Role::Patient => "/patient/dashboard",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Doctor => "Doctor",
            Role::Receptionist => "Receptionist",
            Role::ServiceAttendant => "Service Attendant",
            Role::Pharmacist => "Pharmacist",
            Role::Patient => "Patient",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            "service_attendant" => Ok(Role::ServiceAttendant),
            "pharmacist" => Ok(Role::Pharmacist),
            "patient" => Ok(Role::Patient),
            _ => Err(()),
        }
    }
}

// Cookie `swamicare_session`: { "timestamp": epochMillis }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "timestamp")]
    pub issued_at_millis: i64,
}

impl Session {
    pub fn issued_at(now_millis: i64) -> Self {
        Self { issued_at_millis: now_millis }
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        // Timestamp vem do cliente; sem saturar, i64::MIN estoura
        now_millis.saturating_sub(self.issued_at_millis) >= SESSION_DURATION_MILLIS
    }
}

// Cookie `swamicare_user`: cópia desnormalizada do perfil. A cópia
// autoritativa mora na tabela `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,

    // Papel ausente ou desconhecido vira None (tratado como "sem papel").
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        self.role.is_some_and(|r| allowed.contains(&r))
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.parse().ok()))
}

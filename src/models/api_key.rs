// src/models/api_key.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MAX_ACTIVE_API_KEYS: i64 = 10;
pub const API_KEY_PREFIX: &str = "sk_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPermission {
    Read,
    Write,
    Admin,
}

impl ApiKeyPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyPermission::Read => "read",
            ApiKeyPermission::Write => "write",
            ApiKeyPermission::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Active,
    Inactive,
    Expired,
}

// Linha de `api_keys` (sem o hash, que nunca sai do banco)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub key_preview: String,
}

impl ApiKey {
    pub fn status_at(&self, now: DateTime<Utc>) -> ApiKeyStatus {
        if !self.is_active {
            ApiKeyStatus::Inactive
        } else if self.expires_at.is_some_and(|exp| exp < now) {
            ApiKeyStatus::Expired
        } else {
            ApiKeyStatus::Active
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyView {
    #[serde(flatten)]
    pub key: ApiKey,
    pub status: ApiKeyStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApiKeyPayload {
    #[validate(length(min = 1, max = 100, message = "Name must have 1 to 100 characters."))]
    #[schema(example = "Lab integration")]
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "default_permissions")]
    pub permissions: Vec<ApiKeyPermission>,

    pub expires_at: Option<DateTime<Utc>>,
}

fn default_permissions() -> Vec<ApiKeyPermission> {
    vec![ApiKeyPermission::Read]
}

// Só devolvido uma vez, na criação
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub key: ApiKey,
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(is_active: bool, expires_at: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            name: "ci".into(),
            description: None,
            permissions: vec!["read".into()],
            is_active,
            last_used_at: None,
            expires_at,
            created_at: None,
            key_preview: "sk_abcd1234...ef01".into(),
        }
    }

    #[test]
    fn status_is_derived_from_flags_and_expiry() {
        let now = Utc::now();
        assert_eq!(key(false, None).status_at(now), ApiKeyStatus::Inactive);
        assert_eq!(key(true, Some(now - Duration::hours(1))).status_at(now), ApiKeyStatus::Expired);
        assert_eq!(key(true, Some(now + Duration::hours(1))).status_at(now), ApiKeyStatus::Active);
        assert_eq!(key(true, None).status_at(now), ApiKeyStatus::Active);
    }

    #[test]
    fn permissions_default_to_read() {
        let payload: CreateApiKeyPayload = serde_json::from_str(r#"{"name":"lab"}"#).unwrap();
        assert_eq!(payload.permissions, vec![ApiKeyPermission::Read]);
    }
}

// src/services/api_key_service.rs

use bcrypt::hash;
use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{api_key_repo::NewApiKey, ApiKeyRepository},
    models::api_key::{ApiKeyView, CreateApiKeyPayload, CreatedApiKey, API_KEY_PREFIX, MAX_ACTIVE_API_KEYS},
};

const KEY_BYTES: usize = 32;

/// Gera a chave completa (`sk_` + 64 hex) e o preview que fica no banco.
pub fn generate_api_key() -> (String, String) {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = hex::encode(bytes);

    let preview = format!("{}{}...{}", API_KEY_PREFIX, &secret[..8], &secret[secret.len() - 4..]);
    (format!("{}{}", API_KEY_PREFIX, secret), preview)
}

#[derive(Clone)]
pub struct ApiKeyService {
    repo: ApiKeyRepository,
}

impl ApiKeyService {
    pub fn new(repo: ApiKeyRepository) -> Self {
        Self { repo }
    }

    pub async fn list_keys(&self, user_id: Uuid) -> Result<Vec<ApiKeyView>, AppError> {
        let now = Utc::now();
        let keys = self.repo.list_for_user(user_id).await?;

        Ok(keys
            .into_iter()
            .map(|key| ApiKeyView { status: key.status_at(now), key })
            .collect())
    }

    pub async fn create_key(&self, user_id: Uuid, payload: CreateApiKeyPayload) -> Result<CreatedApiKey, AppError> {
        if payload.expires_at.is_some_and(|exp| exp <= Utc::now()) {
            return Err(AppError::InvalidInput("Expiry must be in the future.".into()));
        }

        let active = self.repo.count_active(user_id).await?;
        if active >= MAX_ACTIVE_API_KEYS {
            return Err(AppError::InvalidInput(format!(
                "Maximum number of API keys reached ({}). Please delete some existing keys first.",
                MAX_ACTIVE_API_KEYS
            )));
        }

        let (api_key, key_preview) = generate_api_key();

        // Só o hash vai para o banco
        let key_clone = api_key.clone();
        let key_hash = tokio::task::spawn_blocking(move || hash(&key_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("API key hashing task failed: {}", e))??;

        let mut permissions: Vec<&'static str> = payload.permissions.iter().map(|p| p.as_str()).collect();
        permissions.sort_unstable();
        permissions.dedup();

        let key = self
            .repo
            .insert(NewApiKey {
                user_id,
                name: payload.name.trim(),
                description: payload.description.as_deref(),
                key_hash: &key_hash,
                key_preview: &key_preview,
                permissions,
                expires_at: payload.expires_at,
            })
            .await?;

        tracing::info!("API key {} created for user {}", key.id, user_id);
        Ok(CreatedApiKey { key, api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_prefix_and_hex_body() {
        let (key, preview) = generate_api_key();
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 64);
        assert!(key.starts_with("sk_"));
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));

        assert!(preview.starts_with(&key[..11]));
        assert!(preview.ends_with(&key[key.len() - 4..]));
        assert!(preview.contains("..."));
    }

    #[test]
    fn generated_keys_are_unique() {
        let (a, _) = generate_api_key();
        let (b, _) = generate_api_key();
        assert_ne!(a, b);
    }
}

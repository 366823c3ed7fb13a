use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDateTime;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::validators::MAX_API_KEY_NAME_LEN;

/// Raw keys look like `lk_<32 base64url chars>`.
pub const API_KEY_PREFIX: &str = "lk_";
/// Characters of the raw key kept in clear for display.
pub const DISPLAY_PREFIX_LEN: usize = 12;

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn create(
        &self,
        tenant_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile>;

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKeyProfile>>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ApiKeyProfile>>;

    async fn count_by_tenant(&self, tenant_id: Uuid) -> AppResult<i64>;

    /// Returns false when no key with this id belongs to the tenant.
    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool>;

    async fn update_last_used(&self, id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub key_prefix: String,
    pub name: String,
    pub is_active: bool,
    pub last_used_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ApiKeyUseCases {
    repo: Arc<dyn ApiKeyRepo>,
}

impl ApiKeyUseCases {
    pub fn new(repo: Arc<dyn ApiKeyRepo>) -> Self {
        Self { repo }
    }

    // ========================================================================
    // Dashboard Operations (tenant session)
    // ========================================================================

    /// Create a new API key for a tenant.
    /// Returns the profile and the raw key (shown only once).
    #[instrument(skip(self))]
    pub async fn create_api_key(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> AppResult<(ApiKeyProfile, String)> {
        let name = name.trim();
        let name = if name.is_empty() { "Default" } else { name };
        if name.chars().count() > MAX_API_KEY_NAME_LEN {
            return Err(AppError::field(
                "name",
                format!("Ensure this field has no more than {MAX_API_KEY_NAME_LEN} characters."),
            ));
        }

        let raw_key = generate_api_key();
        let key_prefix = &raw_key[..DISPLAY_PREFIX_LEN];
        let key_hash = hash_api_key(&raw_key);

        let profile = self
            .repo
            .create(tenant_id, key_prefix, &key_hash, name)
            .await?;

        Ok((profile, raw_key))
    }

    #[instrument(skip(self))]
    pub async fn list_api_keys(&self, tenant_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        self.repo.list_by_tenant(tenant_id).await
    }

    #[instrument(skip(self))]
    pub async fn count_api_keys(&self, tenant_id: Uuid) -> AppResult<i64> {
        self.repo.count_by_tenant(tenant_id).await
    }

    /// Revoke a key. Keys are never hard-deleted so events keep their audit link.
    #[instrument(skip(self))]
    pub async fn deactivate_api_key(&self, tenant_id: Uuid, key_id: Uuid) -> AppResult<()> {
        if !self.repo.deactivate(tenant_id, key_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ========================================================================
    // Ingestion Operations (raw API key)
    // ========================================================================

    /// Validate a raw key. Unknown and inactive keys fail identically.
    #[instrument(skip_all)]
    pub async fn validate(&self, raw_key: &str) -> AppResult<ApiKeyProfile> {
        let raw_key = raw_key.trim();
        if raw_key.is_empty() {
            return Err(AppError::InvalidCredential);
        }

        let key_hash = hash_api_key(raw_key);
        let Some(key) = self.repo.get_by_hash(&key_hash).await? else {
            return Err(AppError::InvalidCredential);
        };

        if !key.is_active {
            return Err(AppError::InvalidCredential);
        }

        // Bookkeeping only; never fail ingestion over it.
        if let Err(err) = self.repo.update_last_used(key.id).await {
            tracing::warn!(error = %err, key_id = %key.id, "Failed to record API key usage");
        }

        Ok(key)
    }
}

// ============================================================================
// Key Generation
// ============================================================================

/// Generate a new API key with format: lk_<base64url_24_bytes>
fn generate_api_key() -> String {
    let mut bytes = [0u8; 24]; // 24 bytes = 32 chars base64
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let random_part = URL_SAFE_NO_PAD.encode(bytes);
    format!("{API_KEY_PREFIX}{random_part}")
}

/// Hash an API key using SHA-256, returning hex-encoded hash.
pub fn hash_api_key(raw_key: &str) -> String {
    let hash = Sha256::digest(raw_key.as_bytes());
    hex::encode(hash)
}

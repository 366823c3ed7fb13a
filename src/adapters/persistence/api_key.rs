use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::api_key::{ApiKeyProfile, ApiKeyRepo},
};

const PROFILE_COLUMNS: &str = "id, tenant_id, key_prefix, name, is_active, last_used_at, created_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> ApiKeyProfile {
    ApiKeyProfile {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        key_prefix: row.get("key_prefix"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        last_used_at: row.get("last_used_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn create(
        &self,
        tenant_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO api_keys (id, tenant_id, key_prefix, key_hash, name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(key_prefix)
        .bind(key_hash)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKeyProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM api_keys WHERE key_hash = $1"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM api_keys
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn count_by_tenant(&self, tenant_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM api_keys WHERE tenant_id = $1 AND is_active",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.get("count"))
    }

    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE api_keys SET is_active = FALSE WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_last_used(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}

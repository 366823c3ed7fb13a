use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::project::{ProjectProfile, ProjectRepo},
    domain::entities::project_kind::ProjectKind,
};

const PROFILE_COLUMNS: &str = "id, tenant_id, name, kind, is_active, created_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> ProjectProfile {
    ProjectProfile {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        kind: row.get("kind"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ProjectRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProjectProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn get_active_by_name(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> AppResult<Option<ProjectProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM projects WHERE tenant_id = $1 AND name = $2 AND is_active"
        ))
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    /// Atomic against concurrent creators: the partial unique index on active
    /// `(tenant_id, name)` makes the loser's insert a no-op returning no row.
    async fn insert_if_absent(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: ProjectKind,
    ) -> AppResult<Option<ProjectProfile>> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO projects (id, tenant_id, name, kind)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, name) WHERE is_active DO NOTHING
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectProfile>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM projects
            WHERE tenant_id = $1 AND is_active
            ORDER BY name ASC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE projects SET is_active = FALSE WHERE id = $1 AND tenant_id = $2 AND is_active",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

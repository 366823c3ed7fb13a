use async_trait::async_trait;
use sqlx::{Row, types::Json};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::event::{
        ActivityEventProfile, DeleteCounts, EventQuery, EventRepo, LlmEventProfile, Metadata,
        NewActivityEvent, NewLlmEvent,
    },
    domain::entities::event_kind::EventKind,
};

const ACTIVITY_COLUMNS: &str =
    "e.id, e.project_id, p.name AS project_name, e.api_key_id, e.user_id, e.message, e.level, e.metadata, e.created_at";

const LLM_COLUMNS: &str = "e.id, e.project_id, p.name AS project_name, e.api_key_id, e.user_id, e.source, e.query, e.response, e.metadata, e.created_at";

fn metadata_from_row(row: &sqlx::postgres::PgRow, entity_type: &str) -> Metadata {
    let id: Uuid = row.get("id");
    let raw: serde_json::Value = row.get("metadata");
    parse_json_with_fallback(&raw, "metadata", entity_type, &id.to_string())
}

fn row_to_activity(row: sqlx::postgres::PgRow) -> ActivityEventProfile {
    ActivityEventProfile {
        metadata: metadata_from_row(&row, "activity_event"),
        id: row.get("id"),
        project_id: row.get("project_id"),
        project_name: row.get("project_name"),
        api_key_id: row.get("api_key_id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        level: row.get("level"),
        created_at: row.get("created_at"),
    }
}

fn row_to_llm(row: sqlx::postgres::PgRow) -> LlmEventProfile {
    LlmEventProfile {
        metadata: metadata_from_row(&row, "llm_event"),
        id: row.get("id"),
        project_id: row.get("project_id"),
        project_name: row.get("project_name"),
        api_key_id: row.get("api_key_id"),
        user_id: row.get("user_id"),
        source: row.get("source"),
        query: row.get("query"),
        response: row.get("response"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl EventRepo for PostgresPersistence {
    async fn insert_activity(&self, event: &NewActivityEvent) -> AppResult<ActivityEventProfile> {
        let row = sqlx::query(&format!(
            r#"
            WITH e AS (
                INSERT INTO activity_events (id, project_id, api_key_id, user_id, message, level, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {ACTIVITY_COLUMNS}
            FROM e
            JOIN projects p ON p.id = e.project_id
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event.project_id)
        .bind(event.api_key_id)
        .bind(&event.user_id)
        .bind(&event.message)
        .bind(event.level)
        .bind(Json(&event.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_activity(row))
    }

    async fn insert_llm(&self, event: &NewLlmEvent) -> AppResult<LlmEventProfile> {
        let row = sqlx::query(&format!(
            r#"
            WITH e AS (
                INSERT INTO llm_events (id, project_id, api_key_id, user_id, source, query, response, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT {LLM_COLUMNS}
            FROM e
            JOIN projects p ON p.id = e.project_id
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event.project_id)
        .bind(event.api_key_id)
        .bind(&event.user_id)
        .bind(&event.source)
        .bind(&event.query)
        .bind(&event.response)
        .bind(Json(&event.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_llm(row))
    }

    async fn list_activity(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<ActivityEventProfile>> {
        // LIMIT NULL means no limit.
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activity_events e
            JOIN projects p ON p.id = e.project_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR e.project_id = $2)
            ORDER BY e.created_at DESC, e.id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(tenant_id)
        .bind(query.project_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_activity).collect())
    }

    async fn list_llm(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<LlmEventProfile>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {LLM_COLUMNS}
            FROM llm_events e
            JOIN projects p ON p.id = e.project_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR e.project_id = $2)
            ORDER BY e.created_at DESC, e.id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(tenant_id)
        .bind(query.project_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_llm).collect())
    }

    async fn get_activity(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ActivityEventProfile>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activity_events e
            JOIN projects p ON p.id = e.project_id
            WHERE e.id = $1 AND p.tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_activity))
    }

    async fn get_llm(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<LlmEventProfile>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {LLM_COLUMNS}
            FROM llm_events e
            JOIN projects p ON p.id = e.project_id
            WHERE e.id = $1 AND p.tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_llm))
    }

    async fn delete_one(&self, tenant_id: Uuid, kind: EventKind, id: Uuid) -> AppResult<bool> {
        let table = match kind {
            EventKind::Activity => "activity_events",
            EventKind::Llm => "llm_events",
        };
        let result = sqlx::query(&format!(
            r#"
            DELETE FROM {table} e
            USING projects p
            WHERE e.id = $1 AND p.id = e.project_id AND p.tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Both tables in one transaction so the reported counts match what was removed.
    async fn delete_all(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<DeleteCounts> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let mut deleted = [0_i64; 2];
        for (slot, table) in ["activity_events", "llm_events"].into_iter().enumerate() {
            let result = sqlx::query(&format!(
                r#"
                DELETE FROM {table} e
                USING projects p
                WHERE p.id = e.project_id
                  AND p.tenant_id = $1
                  AND ($2::uuid IS NULL OR e.project_id = $2)
                "#
            ))
            .bind(tenant_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
            deleted[slot] = result.rows_affected() as i64;
        }

        tx.commit().await.map_err(AppError::from)?;

        Ok(DeleteCounts::new(deleted[0], deleted[1]))
    }
}

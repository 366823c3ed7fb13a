use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::analytics::{
        AnalyticsRepo, LevelCount, MonthCount, ProjectCounts, RawSourceCount,
    },
    domain::entities::event_kind::EventKind,
};

#[async_trait]
impl AnalyticsRepo for PostgresPersistence {
    async fn monthly_counts(
        &self,
        tenant_id: Uuid,
        kind: EventKind,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<MonthCount>> {
        let table = match kind {
            EventKind::Activity => "activity_events",
            EventKind::Llm => "llm_events",
        };
        let rows = sqlx::query(&format!(
            r#"
            SELECT to_char(e.created_at, 'YYYY-MM') AS month, COUNT(*) AS count
            FROM {table} e
            JOIN projects p ON p.id = e.project_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR e.project_id = $2)
            GROUP BY month
            ORDER BY month
            "#
        ))
        .bind(tenant_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| MonthCount {
                month: row.get("month"),
                count: row.get("count"),
            })
            .collect())
    }

    async fn level_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<LevelCount>> {
        let rows = sqlx::query(
            r#"
            SELECT e.level, COUNT(*) AS count
            FROM activity_events e
            JOIN projects p ON p.id = e.project_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR e.project_id = $2)
            GROUP BY e.level
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| LevelCount {
                level: row.get("level"),
                count: row.get("count"),
            })
            .collect())
    }

    async fn source_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<RawSourceCount>> {
        let rows = sqlx::query(
            r#"
            SELECT e.source, COUNT(*) AS count
            FROM llm_events e
            JOIN projects p ON p.id = e.project_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR e.project_id = $2)
            GROUP BY e.source
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| RawSourceCount {
                source: row.get("source"),
                count: row.get("count"),
            })
            .collect())
    }

    async fn project_counts(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectCounts>> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id AS project_id,
                p.name AS project_name,
                (SELECT COUNT(*) FROM activity_events a WHERE a.project_id = p.id) AS activity,
                (SELECT COUNT(*) FROM llm_events l WHERE l.project_id = p.id) AS llm
            FROM projects p
            WHERE p.tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| ProjectCounts {
                project_id: row.get("project_id"),
                project_name: row.get("project_name"),
                activity: row.get("activity"),
                llm: row.get("llm"),
            })
            .collect())
    }
}

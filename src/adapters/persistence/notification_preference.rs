use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::notification::{
        NotificationPreference, NotificationPreferenceInput, NotificationPreferenceRepo,
    },
};

fn row_to_preference(row: sqlx::postgres::PgRow) -> NotificationPreference {
    NotificationPreference {
        tenant_id: row.get("tenant_id"),
        email: row.get("email"),
        enabled: row.get("enabled"),
        notify_on_error: row.get("notify_on_error"),
        notify_on_warning: row.get("notify_on_warning"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl NotificationPreferenceRepo for PostgresPersistence {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<NotificationPreference>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, email, enabled, notify_on_error, notify_on_warning, updated_at
            FROM notification_preferences
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_preference))
    }

    async fn upsert(
        &self,
        tenant_id: Uuid,
        input: &NotificationPreferenceInput,
    ) -> AppResult<NotificationPreference> {
        let row = sqlx::query(
            r#"
            INSERT INTO notification_preferences (tenant_id, email, enabled, notify_on_error, notify_on_warning)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id) DO UPDATE SET
                email = EXCLUDED.email,
                enabled = EXCLUDED.enabled,
                notify_on_error = EXCLUDED.notify_on_error,
                notify_on_warning = EXCLUDED.notify_on_warning,
                updated_at = (NOW() AT TIME ZONE 'utc')
            RETURNING tenant_id, email, enabled, notify_on_error, notify_on_warning, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(&input.email)
        .bind(input.enabled)
        .bind(input.notify_on_error)
        .bind(input.notify_on_warning)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_preference(row))
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::email_templates::event_alert_email;
use crate::application::use_cases::event::ActivityEventProfile;
use crate::application::validators::is_valid_email;
use crate::domain::entities::event_level::EventLevel;

#[async_trait]
pub trait NotificationPreferenceRepo: Send + Sync {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<NotificationPreference>>;

    async fn upsert(
        &self,
        tenant_id: Uuid,
        input: &NotificationPreferenceInput,
    ) -> AppResult<NotificationPreference>;
}

/// Outbound email sink. Transport details live in the adapter.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPreference {
    pub tenant_id: Uuid,
    pub email: String,
    pub enabled: bool,
    pub notify_on_error: bool,
    pub notify_on_warning: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPreferenceInput {
    pub email: String,
    pub enabled: bool,
    pub notify_on_error: bool,
    pub notify_on_warning: bool,
}

/// Whether an event at `level` should reach the tenant's inbox.
pub fn should_notify(preference: Option<&NotificationPreference>, level: EventLevel) -> bool {
    let Some(preference) = preference else {
        return false;
    };
    if !preference.enabled {
        return false;
    }
    match level {
        EventLevel::Error => preference.notify_on_error,
        EventLevel::Warning => preference.notify_on_warning,
        EventLevel::Info | EventLevel::Debug => false,
    }
}

#[derive(Clone)]
pub struct NotificationUseCases {
    repo: Arc<dyn NotificationPreferenceRepo>,
    email: Arc<dyn EmailSender>,
    app_origin: String,
    send_timeout: Duration,
}

impl NotificationUseCases {
    pub fn new(
        repo: Arc<dyn NotificationPreferenceRepo>,
        email: Arc<dyn EmailSender>,
        app_origin: String,
        send_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            email,
            app_origin,
            send_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_preference(&self, tenant_id: Uuid) -> AppResult<Option<NotificationPreference>> {
        self.repo.get_by_tenant(tenant_id).await
    }

    #[instrument(skip(self))]
    pub async fn upsert_preference(
        &self,
        tenant_id: Uuid,
        input: NotificationPreferenceInput,
    ) -> AppResult<NotificationPreference> {
        let email = input.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(AppError::field("email", "Enter a valid email address."));
        }
        let input = NotificationPreferenceInput { email, ..input };
        self.repo.upsert(tenant_id, &input).await
    }

    /// Evaluate and, if warranted, send the alert for one stored event.
    ///
    /// Returns whether an email was sent. Errors are returned to the caller;
    /// `dispatch` is the entry point that swallows them.
    #[instrument(skip(self, event), fields(event_id = %event.id, level = %event.level))]
    pub async fn notify(
        &self,
        tenant_id: Uuid,
        project_name: &str,
        event: &ActivityEventProfile,
    ) -> AppResult<bool> {
        // Cheap filter before touching the store.
        if !event.level.is_alerting() {
            return Ok(false);
        }

        let preference = self.repo.get_by_tenant(tenant_id).await?;
        if !should_notify(preference.as_ref(), event.level) {
            return Ok(false);
        }
        let Some(preference) = preference else {
            return Ok(false);
        };

        let (subject, html) = event_alert_email(&self.app_origin, project_name, event);

        tokio::time::timeout(
            self.send_timeout,
            self.email.send(&preference.email, &subject, &html),
        )
        .await
        .map_err(|_| AppError::Internal("Email delivery timed out".into()))??;

        tracing::info!(to = %preference.email, "Event notification sent");
        Ok(true)
    }

    /// Fire-and-forget: runs `notify` on a background task and only logs failures.
    pub fn dispatch(&self, tenant_id: Uuid, project_name: String, event: ActivityEventProfile) {
        if !event.level.is_alerting() {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.notify(tenant_id, &project_name, &event).await {
                tracing::warn!(
                    error = %err,
                    event_id = %event.id,
                    tenant_id = %tenant_id,
                    "Failed to send event notification"
                );
            }
        });
    }
}

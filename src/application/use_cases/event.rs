use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::project::ProjectUseCases;
use crate::domain::entities::{event_kind::EventKind, event_level::EventLevel};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

/// Caller-supplied key-value metadata, opaque to the core.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Event persistence. Every read and delete is scoped to a tenant through the
/// event's project; rows of other tenants behave as if they don't exist.
#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn insert_activity(&self, event: &NewActivityEvent) -> AppResult<ActivityEventProfile>;

    async fn insert_llm(&self, event: &NewLlmEvent) -> AppResult<LlmEventProfile>;

    /// Newest first. `limit = None` returns every matching row.
    async fn list_activity(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<ActivityEventProfile>>;

    async fn list_llm(&self, tenant_id: Uuid, query: &EventQuery)
    -> AppResult<Vec<LlmEventProfile>>;

    async fn get_activity(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ActivityEventProfile>>;

    async fn get_llm(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<LlmEventProfile>>;

    /// Returns false when the event doesn't exist for this tenant.
    async fn delete_one(&self, tenant_id: Uuid, kind: EventKind, id: Uuid) -> AppResult<bool>;

    async fn delete_all(&self, tenant_id: Uuid, project_id: Option<Uuid>)
    -> AppResult<DeleteCounts>;
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewActivityEvent {
    pub project_id: Uuid,
    pub api_key_id: Uuid,
    pub user_id: String,
    pub message: String,
    pub level: EventLevel,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct NewLlmEvent {
    pub project_id: Uuid,
    pub api_key_id: Uuid,
    pub user_id: String,
    pub source: String,
    pub query: Option<String>,
    pub response: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEventProfile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub api_key_id: Uuid,
    pub user_id: String,
    pub message: String,
    pub level: EventLevel,
    pub metadata: Metadata,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmEventProfile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub api_key_id: Uuid,
    pub user_id: String,
    pub source: String,
    pub query: Option<String>,
    pub response: Option<String>,
    pub metadata: Metadata,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub project_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl EventQuery {
    /// Paged listing with the limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page(project_id: Option<Uuid>, limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            project_id,
            limit: Some(limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    /// Every matching row, for exports.
    pub fn all(project_id: Option<Uuid>) -> Self {
        Self {
            project_id,
            limit: None,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteCounts {
    pub activity_deleted: i64,
    pub llm_deleted: i64,
    pub total_deleted: i64,
}

impl DeleteCounts {
    pub fn new(activity_deleted: i64, llm_deleted: i64) -> Self {
        Self {
            activity_deleted,
            llm_deleted,
            total_deleted: activity_deleted + llm_deleted,
        }
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct EventUseCases {
    repo: Arc<dyn EventRepo>,
    projects: ProjectUseCases,
}

impl EventUseCases {
    pub fn new(repo: Arc<dyn EventRepo>, projects: ProjectUseCases) -> Self {
        Self { repo, projects }
    }

    async fn check_project_filter(&self, tenant_id: Uuid, project_id: Option<Uuid>) -> AppResult<()> {
        if let Some(project_id) = project_id {
            self.projects.get_owned_project(tenant_id, project_id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_activity(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<ActivityEventProfile>> {
        self.check_project_filter(tenant_id, query.project_id).await?;
        self.repo.list_activity(tenant_id, query).await
    }

    #[instrument(skip(self))]
    pub async fn list_llm(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<LlmEventProfile>> {
        self.check_project_filter(tenant_id, query.project_id).await?;
        self.repo.list_llm(tenant_id, query).await
    }

    #[instrument(skip(self))]
    pub async fn get_activity(&self, tenant_id: Uuid, id: Uuid) -> AppResult<ActivityEventProfile> {
        self.repo
            .get_activity(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn get_llm(&self, tenant_id: Uuid, id: Uuid) -> AppResult<LlmEventProfile> {
        self.repo
            .get_llm(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete_one(&self, tenant_id: Uuid, kind: EventKind, id: Uuid) -> AppResult<()> {
        if !self.repo.delete_one(tenant_id, kind, id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_all(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<DeleteCounts> {
        self.check_project_filter(tenant_id, project_id).await?;
        let counts = self.repo.delete_all(tenant_id, project_id).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            project_id = ?project_id,
            activity_deleted = counts.activity_deleted,
            llm_deleted = counts.llm_deleted,
            "Deleted events"
        );
        Ok(counts)
    }
}

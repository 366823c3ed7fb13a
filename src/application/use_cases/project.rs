use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::validators::{MAX_PROJECT_NAME_LEN, normalize_project_name};
use crate::domain::entities::project_kind::ProjectKind;

/// Re-reads after losing an insert race before giving up.
const MAX_RESOLVE_ATTEMPTS: usize = 3;

#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProjectProfile>>;

    async fn get_active_by_name(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> AppResult<Option<ProjectProfile>>;

    /// Atomically insert an active project unless an active one with the same
    /// (tenant, name) exists. Returns `None` when the insert lost to an existing row.
    async fn insert_if_absent(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: ProjectKind,
    ) -> AppResult<Option<ProjectProfile>>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectProfile>>;

    /// Returns false when no active project with this id belongs to the tenant.
    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub kind: ProjectKind,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// How an ingestion request names its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    ById(Uuid),
    ByName {
        name: String,
        kind_hint: ProjectKind,
    },
}

impl ProjectSelector {
    /// Build a selector from the raw request fields.
    ///
    /// When both are present the identifier wins and the name is ignored.
    pub fn from_request(
        project: Option<Uuid>,
        project_name: Option<&str>,
        kind_hint: ProjectKind,
    ) -> AppResult<Self> {
        if let Some(id) = project {
            if project_name.is_some() {
                tracing::debug!(project_id = %id, "Both project and project_name supplied; using project");
            }
            return Ok(ProjectSelector::ById(id));
        }

        match project_name {
            None => Err(AppError::MissingProjectSelector),
            Some(raw) if raw.trim().is_empty() => Err(AppError::MissingProjectSelector),
            Some(raw) => {
                let name = normalize_project_name(raw).ok_or_else(|| {
                    AppError::field(
                        "project_name",
                        format!(
                            "Project name must be 1-{MAX_PROJECT_NAME_LEN} printable characters."
                        ),
                    )
                })?;
                Ok(ProjectSelector::ByName { name, kind_hint })
            }
        }
    }
}

#[derive(Clone)]
pub struct ProjectUseCases {
    repo: Arc<dyn ProjectRepo>,
}

impl ProjectUseCases {
    pub fn new(repo: Arc<dyn ProjectRepo>) -> Self {
        Self { repo }
    }

    /// Resolve the project an ingested event belongs to, creating it on first use.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        tenant_id: Uuid,
        selector: &ProjectSelector,
    ) -> AppResult<ProjectProfile> {
        match selector {
            ProjectSelector::ById(id) => {
                let project = self
                    .repo
                    .get_by_id(*id)
                    .await?
                    .ok_or(AppError::ProjectNotFound)?;
                if project.tenant_id != tenant_id || !project.is_active {
                    return Err(AppError::ProjectNotFound);
                }
                Ok(project)
            }
            ProjectSelector::ByName { name, kind_hint } => {
                self.get_or_create(tenant_id, name, *kind_hint).await
            }
        }
    }

    /// Lookup-or-insert. The store's unique index decides the winner of a race;
    /// the loser reads the winner's row back.
    async fn get_or_create(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: ProjectKind,
    ) -> AppResult<ProjectProfile> {
        for _ in 0..MAX_RESOLVE_ATTEMPTS {
            if let Some(existing) = self.repo.get_active_by_name(tenant_id, name).await? {
                return Ok(existing);
            }

            if let Some(created) = self.repo.insert_if_absent(tenant_id, name, kind).await? {
                tracing::info!(project_id = %created.id, tenant_id = %tenant_id, "Created project on first ingestion");
                return Ok(created);
            }

            // Lost the race: the winner's row is visible on the next lookup unless
            // it was deactivated in between, in which case we try again.
            if let Some(winner) = self.repo.get_active_by_name(tenant_id, name).await? {
                return Ok(winner);
            }
        }

        Err(AppError::Internal(format!(
            "Project resolution for \"{name}\" did not settle"
        )))
    }

    #[instrument(skip(self))]
    pub async fn create_project(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: ProjectKind,
    ) -> AppResult<ProjectProfile> {
        let name = normalize_project_name(name).ok_or_else(|| {
            AppError::field(
                "name",
                format!("Project name must be 1-{MAX_PROJECT_NAME_LEN} printable characters."),
            )
        })?;

        self.repo
            .insert_if_absent(tenant_id, &name, kind)
            .await?
            .ok_or_else(|| AppError::field("name", "A project with this name already exists."))
    }

    #[instrument(skip(self))]
    pub async fn list_projects(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectProfile>> {
        self.repo.list_by_tenant(tenant_id).await
    }

    #[instrument(skip(self))]
    pub async fn deactivate_project(&self, tenant_id: Uuid, project_id: Uuid) -> AppResult<()> {
        if !self.repo.deactivate(tenant_id, project_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Project owned by the tenant (active or not), for scoping reads.
    #[instrument(skip(self))]
    pub async fn get_owned_project(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<ProjectProfile> {
        let project = self
            .repo
            .get_by_id(project_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if project.tenant_id != tenant_id {
            return Err(AppError::NotFound);
        }
        Ok(project)
    }
}

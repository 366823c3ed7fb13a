use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::csv::CsvDocument;
use crate::application::use_cases::{
    analytics::{AnalyticsUseCases, LevelCount, MonthlyPoint, ProjectDistribution, SourceCount},
    event::{ActivityEventProfile, EventQuery, EventUseCases, LlmEventProfile, Metadata},
};

pub const ACTIVITY_HEADER: [&str; 7] = [
    "id",
    "project",
    "user_id",
    "level",
    "message",
    "metadata",
    "created_at",
];
pub const LLM_HEADER: [&str; 8] = [
    "id",
    "project",
    "user_id",
    "source",
    "query",
    "response",
    "metadata",
    "created_at",
];
pub const MONTHLY_HEADER: [&str; 3] = ["month", "activity_events", "llm_events"];
pub const LEVELS_HEADER: [&str; 2] = ["level", "count"];
pub const SOURCES_HEADER: [&str; 2] = ["source", "count"];
pub const PROJECTS_HEADER: [&str; 5] = [
    "project_id",
    "project",
    "activity_events",
    "llm_events",
    "total",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Activity,
    Llm,
    Monthly,
    Levels,
    Sources,
    Projects,
    All,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Activity => "activity",
            ExportKind::Llm => "llm",
            ExportKind::Monthly => "monthly",
            ExportKind::Levels => "levels",
            ExportKind::Sources => "sources",
            ExportKind::Projects => "projects",
            ExportKind::All => "all",
        }
    }
}

impl std::str::FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activity" => Ok(ExportKind::Activity),
            "llm" => Ok(ExportKind::Llm),
            "monthly" => Ok(ExportKind::Monthly),
            "levels" => Ok(ExportKind::Levels),
            "sources" => Ok(ExportKind::Sources),
            "projects" => Ok(ExportKind::Projects),
            "all" => Ok(ExportKind::All),
            other => Err(AppError::InvalidInput(format!(
                "Unknown export type \"{other}\""
            ))),
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

pub fn export_filename(kind: ExportKind, at: NaiveDateTime) -> String {
    format!("{}_export_{}.csv", kind.as_str(), at.format("%Y%m%d_%H%M%S"))
}

fn timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Compact JSON with keys in sorted order.
fn metadata_cell(metadata: &Metadata) -> String {
    let sorted: BTreeMap<&String, &serde_json::Value> = metadata.iter().collect();
    serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// Table renderers
// ============================================================================

pub fn activity_csv(events: &[ActivityEventProfile]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&ACTIVITY_HEADER);
    for e in events {
        doc.row(&[
            e.id.to_string(),
            e.project_name.clone(),
            e.user_id.clone(),
            e.level.as_str().to_string(),
            e.message.clone(),
            metadata_cell(&e.metadata),
            timestamp(e.created_at),
        ]);
    }
    doc
}

pub fn llm_csv(events: &[LlmEventProfile]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&LLM_HEADER);
    for e in events {
        doc.row(&[
            e.id.to_string(),
            e.project_name.clone(),
            e.user_id.clone(),
            e.source.clone(),
            e.query.clone().unwrap_or_default(),
            e.response.clone().unwrap_or_default(),
            metadata_cell(&e.metadata),
            timestamp(e.created_at),
        ]);
    }
    doc
}

pub fn monthly_csv(points: &[MonthlyPoint]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&MONTHLY_HEADER);
    for p in points {
        doc.row(&[p.month.clone(), p.activity.to_string(), p.llm.to_string()]);
    }
    doc
}

pub fn levels_csv(levels: &[LevelCount]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&LEVELS_HEADER);
    for l in levels {
        doc.row(&[l.level.as_str().to_string(), l.count.to_string()]);
    }
    doc
}

pub fn sources_csv(sources: &[SourceCount]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&SOURCES_HEADER);
    for s in sources {
        doc.row(&[s.source.clone(), s.count.to_string()]);
    }
    doc
}

pub fn projects_csv(projects: &[ProjectDistribution]) -> CsvDocument {
    let mut doc = CsvDocument::new();
    doc.row(&PROJECTS_HEADER);
    for p in projects {
        doc.row(&[
            p.project_id.to_string(),
            p.project.clone(),
            p.activity.to_string(),
            p.llm.to_string(),
            p.total.to_string(),
        ]);
    }
    doc
}

/// Titled sections separated by one blank row.
pub fn sectioned(sections: Vec<(&str, CsvDocument)>) -> CsvDocument {
    let mut doc = CsvDocument::new();
    for (i, (title, body)) in sections.into_iter().enumerate() {
        if i > 0 {
            doc.blank_row();
        }
        doc.section_header(title);
        doc.append(body);
    }
    doc
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ExportUseCases {
    events: EventUseCases,
    analytics: AnalyticsUseCases,
}

impl ExportUseCases {
    pub fn new(events: EventUseCases, analytics: AnalyticsUseCases) -> Self {
        Self { events, analytics }
    }

    /// Render one export for the tenant. `include_projects` only matters for
    /// `All` without a project filter.
    #[instrument(skip(self))]
    pub async fn export(
        &self,
        tenant_id: Uuid,
        kind: ExportKind,
        project_id: Option<Uuid>,
        include_projects: bool,
    ) -> AppResult<CsvExport> {
        self.analytics
            .check_project_filter(tenant_id, project_id)
            .await?;

        let doc = match kind {
            ExportKind::Activity => activity_csv(&self.all_activity(tenant_id, project_id).await?),
            ExportKind::Llm => llm_csv(&self.all_llm(tenant_id, project_id).await?),
            ExportKind::Monthly => {
                monthly_csv(&self.analytics.monthly(tenant_id, project_id).await?)
            }
            ExportKind::Levels => levels_csv(&self.analytics.levels(tenant_id, project_id).await?),
            ExportKind::Sources => {
                sources_csv(&self.analytics.sources(tenant_id, project_id).await?)
            }
            ExportKind::Projects => {
                let projects = match project_id {
                    Some(_) => Vec::new(),
                    None => self.analytics.project_distribution(tenant_id).await?,
                };
                projects_csv(&projects)
            }
            ExportKind::All => {
                let mut sections = vec![
                    (
                        "Activity Events",
                        activity_csv(&self.all_activity(tenant_id, project_id).await?),
                    ),
                    (
                        "LLM Events",
                        llm_csv(&self.all_llm(tenant_id, project_id).await?),
                    ),
                ];
                if include_projects && project_id.is_none() {
                    let projects = self.analytics.project_distribution(tenant_id).await?;
                    sections.push(("Project Distribution", projects_csv(&projects)));
                }
                sectioned(sections)
            }
        };

        let filename = export_filename(kind, Utc::now().naive_utc());
        tracing::info!(tenant_id = %tenant_id, kind = kind.as_str(), %filename, "Export rendered");

        Ok(CsvExport {
            filename,
            body: doc.finish(),
        })
    }

    async fn all_activity(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<ActivityEventProfile>> {
        self.events
            .list_activity(tenant_id, &EventQuery::all(project_id))
            .await
    }

    async fn all_llm(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<LlmEventProfile>> {
        self.events
            .list_llm(tenant_id, &EventQuery::all(project_id))
            .await
    }
}

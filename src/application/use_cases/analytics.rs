use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::AppResult;
use crate::application::use_cases::{api_key::ApiKeyUseCases, project::ProjectUseCases};
use crate::domain::entities::{event_kind::EventKind, event_level::EventLevel};

/// Label for LLM events recorded without a usable source.
pub const UNKNOWN_SOURCE: &str = "Unknown";

// ============================================================================
// Repository Trait
// ============================================================================

/// Grouped counts straight from the event store. Each method is an independent
/// read scoped to the tenant and, when given, one project.
#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    /// Counts per `YYYY-MM` bucket, any order.
    async fn monthly_counts(
        &self,
        tenant_id: Uuid,
        kind: EventKind,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<MonthCount>>;

    async fn level_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<LevelCount>>;

    /// Raw source values; `None` for rows stored without one.
    async fn source_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<RawSourceCount>>;

    /// One row per project of the tenant, including inactive ones.
    async fn project_counts(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectCounts>>;
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: EventLevel,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSourceCount {
    pub source: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCounts {
    pub project_id: Uuid,
    pub project_name: String,
    pub activity: i64,
    pub llm: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub activity: i64,
    pub llm: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDistribution {
    pub project_id: Uuid,
    pub project: String,
    pub activity: i64,
    pub llm: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub activity: i64,
    pub llm: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub project_id: Option<Uuid>,
    pub monthly: Vec<MonthlyPoint>,
    pub levels: Vec<LevelCount>,
    pub sources: Vec<SourceCount>,
    /// Empty when the report is scoped to one project.
    pub projects: Vec<ProjectDistribution>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_activity_events: i64,
    pub total_llm_events: i64,
    pub total_events: i64,
    /// Every level, zero-filled.
    pub levels: Vec<LevelCount>,
    pub api_key_count: i64,
}

// ============================================================================
// Rollups
// ============================================================================

/// Union of the months present in either series, ascending, zero-filled.
pub fn merge_monthly(activity: &[MonthCount], llm: &[MonthCount]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for row in activity {
        months.entry(&row.month).or_default().0 += row.count;
    }
    for row in llm {
        months.entry(&row.month).or_default().1 += row.count;
    }
    months
        .into_iter()
        .map(|(month, (activity, llm))| MonthlyPoint {
            month: month.to_string(),
            activity,
            llm,
        })
        .collect()
}

pub fn totals(monthly: &[MonthlyPoint]) -> Totals {
    let activity = monthly.iter().map(|p| p.activity).sum();
    let llm = monthly.iter().map(|p| p.llm).sum();
    Totals {
        activity,
        llm,
        total: activity + llm,
    }
}

/// Levels that occur, in severity order.
pub fn order_levels(rows: &[LevelCount]) -> Vec<LevelCount> {
    let mut by_level: BTreeMap<EventLevel, i64> = BTreeMap::new();
    for row in rows {
        *by_level.entry(row.level).or_default() += row.count;
    }
    by_level
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(level, count)| LevelCount { level, count })
        .collect()
}

/// All four levels, missing ones as zero.
pub fn zero_filled_levels(rows: &[LevelCount]) -> Vec<LevelCount> {
    EventLevel::iter()
        .map(|level| LevelCount {
            level,
            count: rows
                .iter()
                .filter(|r| r.level == level)
                .map(|r| r.count)
                .sum(),
        })
        .collect()
}

/// Null and blank sources collapse into one "Unknown" bucket; count desc, label asc.
pub fn merge_sources(rows: &[RawSourceCount]) -> Vec<SourceCount> {
    let mut buckets: HashMap<String, i64> = HashMap::new();
    for row in rows {
        let label = match row.source.as_deref() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => UNKNOWN_SOURCE.to_string(),
        };
        *buckets.entry(label).or_default() += row.count;
    }

    let mut sources: Vec<SourceCount> = buckets
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect();
    sources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
    sources
}

/// Drops empty projects; total desc, name asc.
pub fn rank_projects(rows: &[ProjectCounts]) -> Vec<ProjectDistribution> {
    let mut projects: Vec<ProjectDistribution> = rows
        .iter()
        .map(|row| ProjectDistribution {
            project_id: row.project_id,
            project: row.project_name.clone(),
            activity: row.activity,
            llm: row.llm,
            total: row.activity + row.llm,
        })
        .filter(|p| p.total > 0)
        .collect();
    projects.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.project.cmp(&b.project))
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    projects
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AnalyticsUseCases {
    repo: Arc<dyn AnalyticsRepo>,
    projects: ProjectUseCases,
    api_keys: ApiKeyUseCases,
}

impl AnalyticsUseCases {
    pub fn new(
        repo: Arc<dyn AnalyticsRepo>,
        projects: ProjectUseCases,
        api_keys: ApiKeyUseCases,
    ) -> Self {
        Self {
            repo,
            projects,
            api_keys,
        }
    }

    /// Reject a project filter the tenant doesn't own.
    pub async fn check_project_filter(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<()> {
        if let Some(project_id) = project_id {
            self.projects.get_owned_project(tenant_id, project_id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn monthly(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<MonthlyPoint>> {
        let activity = self
            .repo
            .monthly_counts(tenant_id, EventKind::Activity, project_id)
            .await?;
        let llm = self
            .repo
            .monthly_counts(tenant_id, EventKind::Llm, project_id)
            .await?;
        Ok(merge_monthly(&activity, &llm))
    }

    #[instrument(skip(self))]
    pub async fn levels(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<LevelCount>> {
        let rows = self.repo.level_counts(tenant_id, project_id).await?;
        Ok(order_levels(&rows))
    }

    #[instrument(skip(self))]
    pub async fn sources(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<SourceCount>> {
        let rows = self.repo.source_counts(tenant_id, project_id).await?;
        Ok(merge_sources(&rows))
    }

    #[instrument(skip(self))]
    pub async fn project_distribution(
        &self,
        tenant_id: Uuid,
    ) -> AppResult<Vec<ProjectDistribution>> {
        let rows = self.repo.project_counts(tenant_id).await?;
        Ok(rank_projects(&rows))
    }

    /// Full dashboard report. The distributions are separate reads and may lag
    /// the monthly series under concurrent writes; totals never do.
    #[instrument(skip(self))]
    pub async fn report(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<AnalyticsReport> {
        self.check_project_filter(tenant_id, project_id).await?;

        let monthly = self.monthly(tenant_id, project_id).await?;
        let levels = self.levels(tenant_id, project_id).await?;
        let sources = self.sources(tenant_id, project_id).await?;
        let projects = match project_id {
            Some(_) => Vec::new(),
            None => self.project_distribution(tenant_id).await?,
        };
        let totals = totals(&monthly);

        Ok(AnalyticsReport {
            project_id,
            monthly,
            levels,
            sources,
            projects,
            totals,
        })
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, tenant_id: Uuid) -> AppResult<Stats> {
        let totals = totals(&self.monthly(tenant_id, None).await?);
        let level_rows = self.repo.level_counts(tenant_id, None).await?;
        let api_key_count = self.api_keys.count_api_keys(tenant_id).await?;

        Ok(Stats {
            total_activity_events: totals.activity,
            total_llm_events: totals.llm,
            total_events: totals.total,
            levels: zero_filled_levels(&level_rows),
            api_key_count,
        })
    }
}

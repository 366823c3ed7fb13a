//! In-memory stand-in for `PostgresPersistence`.
//!
//! One struct implements every repository trait over a single mutex, so a use
//! case sees the same rows whichever port it reads through, just like the
//! shared Postgres pool.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::{
        analytics::{AnalyticsRepo, LevelCount, MonthCount, ProjectCounts, RawSourceCount},
        api_key::{ApiKeyProfile, ApiKeyRepo, hash_api_key},
        event::{
            ActivityEventProfile, DeleteCounts, EventQuery, EventRepo, LlmEventProfile,
            NewActivityEvent, NewLlmEvent,
        },
        notification::{
            NotificationPreference, NotificationPreferenceInput, NotificationPreferenceRepo,
        },
        project::{ProjectProfile, ProjectRepo},
    },
    domain::entities::{event_kind::EventKind, event_level::EventLevel, project_kind::ProjectKind},
};

#[derive(Default)]
struct State {
    /// key id -> (sha256 hash, profile)
    api_keys: HashMap<Uuid, (String, ApiKeyProfile)>,
    projects: HashMap<Uuid, ProjectProfile>,
    activity: Vec<ActivityEventProfile>,
    llm: Vec<LlmEventProfile>,
    preferences: HashMap<Uuid, NotificationPreference>,
    hide_next_name_lookup: bool,
}

impl State {
    fn tenant_of(&self, project_id: Uuid) -> Option<Uuid> {
        self.projects.get(&project_id).map(|p| p.tenant_id)
    }

    fn owns(&self, tenant_id: Uuid, project_id: Uuid) -> bool {
        self.tenant_of(project_id) == Some(tenant_id)
    }

    fn project_name(&self, project_id: Uuid) -> String {
        self.projects
            .get(&project_id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn with_activity_name(&self, mut event: ActivityEventProfile) -> ActivityEventProfile {
        event.project_name = self.project_name(event.project_id);
        event
    }

    fn with_llm_name(&self, mut event: LlmEventProfile) -> LlmEventProfile {
        event.project_name = self.project_name(event.project_id);
        event
    }

    fn matches(&self, tenant_id: Uuid, project_id: Uuid, filter: Option<Uuid>) -> bool {
        self.owns(tenant_id, project_id) && filter.is_none_or(|f| f == project_id)
    }
}

/// Newest first, ties broken by id, then paged.
fn page<T>(
    mut rows: Vec<T>,
    query: &EventQuery,
    key: impl Fn(&T) -> (chrono::NaiveDateTime, Uuid),
) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    let offset = query.offset.max(0) as usize;
    let rows = rows.into_iter().skip(offset);
    match query.limit {
        Some(limit) => rows.take(limit.max(0) as usize).collect(),
        None => rows.collect(),
    }
}

#[derive(Default)]
pub struct InMemoryPersistence {
    state: Mutex<State>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(self, projects: Vec<ProjectProfile>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for p in projects {
                state.projects.insert(p.id, p);
            }
        }
        self
    }

    /// Seed keys; each one's hash is derived from its id since the raw token is unknown.
    pub fn with_api_keys(self, keys: Vec<ApiKeyProfile>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for k in keys {
                state
                    .api_keys
                    .insert(k.id, (hash_api_key(&k.id.to_string()), k));
            }
        }
        self
    }

    pub fn with_activity_events(self, events: Vec<ActivityEventProfile>) -> Self {
        self.state.lock().unwrap().activity.extend(events);
        self
    }

    pub fn with_llm_events(self, events: Vec<LlmEventProfile>) -> Self {
        self.state.lock().unwrap().llm.extend(events);
        self
    }

    pub fn with_preferences(self, preferences: Vec<NotificationPreference>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for p in preferences {
                state.preferences.insert(p.tenant_id, p);
            }
        }
        self
    }

    pub fn insert_project(&self, project: ProjectProfile) {
        self.state
            .lock()
            .unwrap()
            .projects
            .insert(project.id, project);
    }

    pub fn insert_preference(&self, preference: NotificationPreference) {
        self.state
            .lock()
            .unwrap()
            .preferences
            .insert(preference.tenant_id, preference);
    }

    /// Make the next by-name lookup miss, simulating a concurrent creator that
    /// commits between our lookup and our insert.
    pub fn hide_next_name_lookup(&self) {
        self.state.lock().unwrap().hide_next_name_lookup = true;
    }

    /// All projects of a tenant, active or not (for test assertions).
    pub fn projects_for(&self, tenant_id: Uuid) -> Vec<ProjectProfile> {
        self.state
            .lock()
            .unwrap()
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub fn api_key(&self, id: Uuid) -> Option<ApiKeyProfile> {
        self.state
            .lock()
            .unwrap()
            .api_keys
            .get(&id)
            .map(|(_, k)| k.clone())
    }

    pub fn activity_count(&self) -> usize {
        self.state.lock().unwrap().activity.len()
    }

    pub fn llm_count(&self) -> usize {
        self.state.lock().unwrap().llm.len()
    }
}

// ============================================================================
// ApiKeyRepo
// ============================================================================

#[async_trait]
impl ApiKeyRepo for InMemoryPersistence {
    async fn create(
        &self,
        tenant_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile> {
        let profile = ApiKeyProfile {
            id: Uuid::new_v4(),
            tenant_id,
            key_prefix: key_prefix.to_string(),
            name: name.to_string(),
            is_active: true,
            last_used_at: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.state
            .lock()
            .unwrap()
            .api_keys
            .insert(profile.id, (key_hash.to_string(), profile.clone()));
        Ok(profile)
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKeyProfile>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .api_keys
            .values()
            .find(|(hash, _)| hash == key_hash)
            .map(|(_, k)| k.clone()))
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        let mut keys: Vec<ApiKeyProfile> = self
            .state
            .lock()
            .unwrap()
            .api_keys
            .values()
            .filter(|(_, k)| k.tenant_id == tenant_id)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn count_by_tenant(&self, tenant_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .api_keys
            .values()
            .filter(|(_, k)| k.tenant_id == tenant_id && k.is_active)
            .count() as i64)
    }

    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.api_keys.get_mut(&id) {
            Some((_, key)) if key.tenant_id == tenant_id => {
                key.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_last_used(&self, id: Uuid) -> AppResult<()> {
        if let Some((_, key)) = self.state.lock().unwrap().api_keys.get_mut(&id) {
            key.last_used_at = Some(chrono::Utc::now().naive_utc());
        }
        Ok(())
    }
}

// ============================================================================
// ProjectRepo
// ============================================================================

#[async_trait]
impl ProjectRepo for InMemoryPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ProjectProfile>> {
        Ok(self.state.lock().unwrap().projects.get(&id).cloned())
    }

    async fn get_active_by_name(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> AppResult<Option<ProjectProfile>> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.hide_next_name_lookup) {
            return Ok(None);
        }
        Ok(state
            .projects
            .values()
            .find(|p| p.tenant_id == tenant_id && p.is_active && p.name == name)
            .cloned())
    }

    async fn insert_if_absent(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: ProjectKind,
    ) -> AppResult<Option<ProjectProfile>> {
        let mut state = self.state.lock().unwrap();
        let taken = state
            .projects
            .values()
            .any(|p| p.tenant_id == tenant_id && p.is_active && p.name == name);
        if taken {
            return Ok(None);
        }

        let project = ProjectProfile {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            kind,
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        };
        state.projects.insert(project.id, project.clone());
        Ok(Some(project))
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectProfile>> {
        let mut projects: Vec<ProjectProfile> = self
            .state
            .lock()
            .unwrap()
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.is_active)
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.projects.get_mut(&id) {
            Some(p) if p.tenant_id == tenant_id && p.is_active => {
                p.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// EventRepo
// ============================================================================

#[async_trait]
impl EventRepo for InMemoryPersistence {
    async fn insert_activity(&self, event: &NewActivityEvent) -> AppResult<ActivityEventProfile> {
        let mut state = self.state.lock().unwrap();
        let profile = ActivityEventProfile {
            id: Uuid::new_v4(),
            project_id: event.project_id,
            project_name: state.project_name(event.project_id),
            api_key_id: event.api_key_id,
            user_id: event.user_id.clone(),
            message: event.message.clone(),
            level: event.level,
            metadata: event.metadata.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        state.activity.push(profile.clone());
        Ok(profile)
    }

    async fn insert_llm(&self, event: &NewLlmEvent) -> AppResult<LlmEventProfile> {
        let mut state = self.state.lock().unwrap();
        let profile = LlmEventProfile {
            id: Uuid::new_v4(),
            project_id: event.project_id,
            project_name: state.project_name(event.project_id),
            api_key_id: event.api_key_id,
            user_id: event.user_id.clone(),
            source: event.source.clone(),
            query: event.query.clone(),
            response: event.response.clone(),
            metadata: event.metadata.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        state.llm.push(profile.clone());
        Ok(profile)
    }

    async fn list_activity(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<ActivityEventProfile>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .activity
            .iter()
            .filter(|e| state.matches(tenant_id, e.project_id, query.project_id))
            .map(|e| state.with_activity_name(e.clone()))
            .collect();
        Ok(page(rows, query, |e| (e.created_at, e.id)))
    }

    async fn list_llm(
        &self,
        tenant_id: Uuid,
        query: &EventQuery,
    ) -> AppResult<Vec<LlmEventProfile>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .llm
            .iter()
            .filter(|e| state.matches(tenant_id, e.project_id, query.project_id))
            .map(|e| state.with_llm_name(e.clone()))
            .collect();
        Ok(page(rows, query, |e| (e.created_at, e.id)))
    }

    async fn get_activity(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ActivityEventProfile>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .activity
            .iter()
            .find(|e| e.id == id && state.owns(tenant_id, e.project_id))
            .map(|e| state.with_activity_name(e.clone())))
    }

    async fn get_llm(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<LlmEventProfile>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .llm
            .iter()
            .find(|e| e.id == id && state.owns(tenant_id, e.project_id))
            .map(|e| state.with_llm_name(e.clone())))
    }

    async fn delete_one(&self, tenant_id: Uuid, kind: EventKind, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        let owned: Vec<Uuid> = state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.id)
            .collect();
        let deleted = match kind {
            EventKind::Activity => {
                let before = state.activity.len();
                state
                    .activity
                    .retain(|e| !(e.id == id && owned.contains(&e.project_id)));
                before != state.activity.len()
            }
            EventKind::Llm => {
                let before = state.llm.len();
                state
                    .llm
                    .retain(|e| !(e.id == id && owned.contains(&e.project_id)));
                before != state.llm.len()
            }
        };
        Ok(deleted)
    }

    async fn delete_all(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<DeleteCounts> {
        let mut state = self.state.lock().unwrap();
        let targets: Vec<Uuid> = state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id && project_id.is_none_or(|f| f == p.id))
            .map(|p| p.id)
            .collect();

        let before_activity = state.activity.len();
        state.activity.retain(|e| !targets.contains(&e.project_id));
        let activity_deleted = (before_activity - state.activity.len()) as i64;

        let before_llm = state.llm.len();
        state.llm.retain(|e| !targets.contains(&e.project_id));
        let llm_deleted = (before_llm - state.llm.len()) as i64;

        Ok(DeleteCounts::new(activity_deleted, llm_deleted))
    }
}

// ============================================================================
// AnalyticsRepo
// ============================================================================

#[async_trait]
impl AnalyticsRepo for InMemoryPersistence {
    async fn monthly_counts(
        &self,
        tenant_id: Uuid,
        kind: EventKind,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<MonthCount>> {
        let state = self.state.lock().unwrap();
        let stamps: Vec<(Uuid, chrono::NaiveDateTime)> = match kind {
            EventKind::Activity => state
                .activity
                .iter()
                .map(|e| (e.project_id, e.created_at))
                .collect(),
            EventKind::Llm => state
                .llm
                .iter()
                .map(|e| (e.project_id, e.created_at))
                .collect(),
        };

        let mut months: HashMap<String, i64> = HashMap::new();
        for (pid, at) in stamps {
            if state.matches(tenant_id, pid, project_id) {
                *months.entry(at.format("%Y-%m").to_string()).or_default() += 1;
            }
        }
        Ok(months
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect())
    }

    async fn level_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<LevelCount>> {
        let state = self.state.lock().unwrap();
        let mut levels: HashMap<EventLevel, i64> = HashMap::new();
        for e in &state.activity {
            if state.matches(tenant_id, e.project_id, project_id) {
                *levels.entry(e.level).or_default() += 1;
            }
        }
        Ok(levels
            .into_iter()
            .map(|(level, count)| LevelCount { level, count })
            .collect())
    }

    async fn source_counts(
        &self,
        tenant_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<RawSourceCount>> {
        let state = self.state.lock().unwrap();
        let mut sources: HashMap<String, i64> = HashMap::new();
        for e in &state.llm {
            if state.matches(tenant_id, e.project_id, project_id) {
                *sources.entry(e.source.clone()).or_default() += 1;
            }
        }
        Ok(sources
            .into_iter()
            .map(|(source, count)| RawSourceCount {
                source: Some(source),
                count,
            })
            .collect())
    }

    async fn project_counts(&self, tenant_id: Uuid) -> AppResult<Vec<ProjectCounts>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| ProjectCounts {
                project_id: p.id,
                project_name: p.name.clone(),
                activity: state.activity.iter().filter(|e| e.project_id == p.id).count() as i64,
                llm: state.llm.iter().filter(|e| e.project_id == p.id).count() as i64,
            })
            .collect())
    }
}

// ============================================================================
// NotificationPreferenceRepo
// ============================================================================

#[async_trait]
impl NotificationPreferenceRepo for InMemoryPersistence {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<NotificationPreference>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .preferences
            .get(&tenant_id)
            .cloned())
    }

    async fn upsert(
        &self,
        tenant_id: Uuid,
        input: &NotificationPreferenceInput,
    ) -> AppResult<NotificationPreference> {
        let preference = NotificationPreference {
            tenant_id,
            email: input.email.clone(),
            enabled: input.enabled,
            notify_on_error: input.notify_on_error,
            notify_on_warning: input.notify_on_warning,
            updated_at: chrono::Utc::now().naive_utc(),
        };
        self.insert_preference(preference.clone());
        Ok(preference)
    }
}

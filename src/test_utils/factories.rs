//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    application::use_cases::{
        api_key::ApiKeyProfile,
        event::{ActivityEventProfile, LlmEventProfile, Metadata},
        notification::NotificationPreference,
        project::ProjectProfile,
    },
    domain::entities::{event_level::EventLevel, project_kind::ProjectKind},
};

/// Create a test project with sensible defaults.
pub fn create_test_project(
    tenant_id: Uuid,
    overrides: impl FnOnce(&mut ProjectProfile),
) -> ProjectProfile {
    let mut project = ProjectProfile {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Test Project".to_string(),
        kind: ProjectKind::Activity,
        is_active: true,
        created_at: test_datetime(),
    };
    overrides(&mut project);
    project
}

/// Create a test API key profile. The in-memory store derives its hash from the id.
pub fn create_test_api_key(
    tenant_id: Uuid,
    overrides: impl FnOnce(&mut ApiKeyProfile),
) -> ApiKeyProfile {
    let mut key = ApiKeyProfile {
        id: Uuid::new_v4(),
        tenant_id,
        key_prefix: "lk_testkey12".to_string(),
        name: "Default".to_string(),
        is_active: true,
        last_used_at: None,
        created_at: test_datetime(),
    };
    overrides(&mut key);
    key
}

/// Create a test activity event. `project_name` is filled in by the store on read.
pub fn create_test_activity_event(
    project_id: Uuid,
    api_key_id: Uuid,
    overrides: impl FnOnce(&mut ActivityEventProfile),
) -> ActivityEventProfile {
    let mut event = ActivityEventProfile {
        id: Uuid::new_v4(),
        project_id,
        project_name: "Test Project".to_string(),
        api_key_id,
        user_id: "user-1".to_string(),
        message: "Something happened".to_string(),
        level: EventLevel::Info,
        metadata: Metadata::new(),
        created_at: test_datetime(),
    };
    overrides(&mut event);
    event
}

/// Create a test LLM event.
pub fn create_test_llm_event(
    project_id: Uuid,
    api_key_id: Uuid,
    overrides: impl FnOnce(&mut LlmEventProfile),
) -> LlmEventProfile {
    let mut event = LlmEventProfile {
        id: Uuid::new_v4(),
        project_id,
        project_name: "Test Project".to_string(),
        api_key_id,
        user_id: "user-1".to_string(),
        source: "openai".to_string(),
        query: Some("What is 2+2?".to_string()),
        response: Some("4".to_string()),
        metadata: Metadata::new(),
        created_at: test_datetime(),
    };
    overrides(&mut event);
    event
}

/// Create a notification preference with every gate open.
pub fn create_test_preference(
    tenant_id: Uuid,
    overrides: impl FnOnce(&mut NotificationPreference),
) -> NotificationPreference {
    let mut preference = NotificationPreference {
        tenant_id,
        email: "alerts@example.com".to_string(),
        enabled: true,
        notify_on_error: true,
        notify_on_warning: true,
        updated_at: test_datetime(),
    };
    overrides(&mut preference);
    preference
}

/// Returns a fixed test datetime for consistent test data.
pub fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply() {
        let tenant_id = Uuid::new_v4();
        let project = create_test_project(tenant_id, |p| p.name = "Custom".to_string());
        assert_eq!(project.name, "Custom");
        assert_eq!(project.tenant_id, tenant_id);
        assert!(project.is_active);
    }
}

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, FieldErrors};
use crate::application::use_cases::{
    api_key::ApiKeyUseCases,
    event::{
        ActivityEventProfile, EventRepo, LlmEventProfile, Metadata, NewActivityEvent, NewLlmEvent,
    },
    notification::NotificationUseCases,
    project::{ProjectProfile, ProjectSelector, ProjectUseCases},
};
use crate::application::validators::{MAX_USER_ID_LEN, is_valid_user_id};
use crate::domain::entities::{event_kind::EventKind, event_level::EventLevel};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";

// ============================================================================
// Payloads
// ============================================================================

/// Raw body of `POST /event-log`. Every field is an untyped JSON value at the
/// serde layer so that shape problems are reported per field instead of as a
/// parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityEventPayload {
    pub api_key: Option<Value>,
    pub project: Option<Value>,
    pub project_name: Option<Value>,
    pub user_id: Option<Value>,
    pub message: Option<Value>,
    pub level: Option<Value>,
    pub metadata: Option<Value>,
}

/// Raw body of `POST /llm-log`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmEventPayload {
    pub api_key: Option<Value>,
    pub project: Option<Value>,
    pub project_name: Option<Value>,
    pub user_id: Option<Value>,
    pub source: Option<Value>,
    pub query: Option<Value>,
    pub response: Option<Value>,
    pub metadata: Option<Value>,
}

/// Fields shared by both payloads once the shape check passed. The selector is
/// kept as a result because a missing selector is reported only after the
/// credential check.
struct Envelope {
    api_key: String,
    user_id: String,
    metadata: Metadata,
    selector: AppResult<ProjectSelector>,
}

// ============================================================================
// Shape checks
// ============================================================================

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Strict text: only JSON strings are accepted. `null` counts as absent.
fn string_value(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        _ => {
            push(errors, field, NOT_A_STRING);
            None
        }
    }
}

/// Lenient text: numbers are accepted and rendered as their decimal form.
fn text_value(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) => Some(n.to_string()),
        other => string_value(errors, field, other),
    }
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
    convert: fn(&mut FieldErrors, &str, Option<Value>) -> Option<String>,
) -> Option<String> {
    if matches!(value, None | Some(Value::Null)) {
        push(errors, field, REQUIRED);
        return None;
    }
    let text = convert(errors, field, value)?;
    if text.trim().is_empty() {
        push(errors, field, BLANK);
        return None;
    }
    Some(text)
}

fn parse_metadata(errors: &mut FieldErrors, value: Option<Value>) -> Metadata {
    match value {
        None | Some(Value::Null) => Metadata::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            push(errors, "metadata", "Must be a JSON object.");
            Metadata::new()
        }
    }
}

fn parse_level(errors: &mut FieldErrors, value: Option<Value>) -> EventLevel {
    let Some(raw) = string_value(errors, "level", value) else {
        return EventLevel::default();
    };
    raw.parse().unwrap_or_else(|msg: String| {
        push(errors, "level", msg);
        EventLevel::default()
    })
}

/// Blank strings count as absent; anything else must be a UUID.
fn parse_project_id(errors: &mut FieldErrors, value: Option<&str>) -> Result<Option<Uuid>, ()> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    Uuid::parse_str(raw).map(Some).map_err(|_| {
        push(errors, "project", format!("\"{raw}\" is not a valid UUID."));
    })
}

fn check_envelope(
    errors: &mut FieldErrors,
    api_key: Option<Value>,
    project: Option<Value>,
    project_name: Option<Value>,
    user_id: Option<Value>,
    metadata: Option<Value>,
    kind: EventKind,
) -> Option<Envelope> {
    let api_key = required_text(errors, "api_key", api_key, string_value);
    let project = string_value(errors, "project", project);
    let project_name = string_value(errors, "project_name", project_name);

    let user_id = required_text(errors, "user_id", user_id, text_value).filter(|user_id| {
        let ok = is_valid_user_id(user_id);
        if !ok {
            push(
                errors,
                "user_id",
                format!("Ensure this field has no more than {MAX_USER_ID_LEN} characters."),
            );
        }
        ok
    });

    let metadata = parse_metadata(errors, metadata);

    let selector = match parse_project_id(errors, project.as_deref()) {
        Err(()) => None,
        Ok(project_id) => match ProjectSelector::from_request(
            project_id,
            project_name.as_deref(),
            kind.project_kind_hint(),
        ) {
            Err(AppError::Validation(field_errors)) => {
                for (field, messages) in field_errors {
                    for message in messages {
                        push(errors, &field, message);
                    }
                }
                None
            }
            other => Some(other),
        },
    };

    Some(Envelope {
        api_key: api_key?,
        user_id: user_id?,
        metadata,
        selector: selector?,
    })
}

// ============================================================================
// Use Cases
// ============================================================================

/// The ingestion pipeline: credential, project resolution, append, then the
/// best-effort notification hand-off.
#[derive(Clone)]
pub struct IngestUseCases {
    api_keys: ApiKeyUseCases,
    projects: ProjectUseCases,
    events: Arc<dyn EventRepo>,
    notifications: NotificationUseCases,
}

impl IngestUseCases {
    pub fn new(
        api_keys: ApiKeyUseCases,
        projects: ProjectUseCases,
        events: Arc<dyn EventRepo>,
        notifications: NotificationUseCases,
    ) -> Self {
        Self {
            api_keys,
            projects,
            events,
            notifications,
        }
    }

    /// Credential first, then the selector. Returns (api key id, tenant id, project).
    async fn admit(&self, envelope: &mut Envelope) -> AppResult<(Uuid, Uuid, ProjectProfile)> {
        let key = self.api_keys.validate(&envelope.api_key).await?;

        let selector = std::mem::replace(
            &mut envelope.selector,
            Err(AppError::MissingProjectSelector),
        )?;
        let project = self.projects.resolve(key.tenant_id, &selector).await?;

        Ok((key.id, key.tenant_id, project))
    }

    #[instrument(skip_all)]
    pub async fn ingest_activity(
        &self,
        payload: ActivityEventPayload,
    ) -> AppResult<ActivityEventProfile> {
        let mut errors = FieldErrors::new();
        let envelope = check_envelope(
            &mut errors,
            payload.api_key,
            payload.project,
            payload.project_name,
            payload.user_id,
            payload.metadata,
            EventKind::Activity,
        );
        let message = required_text(&mut errors, "message", payload.message, text_value);
        let level = parse_level(&mut errors, payload.level);

        let (Some(mut envelope), Some(message), true) = (envelope, message, errors.is_empty())
        else {
            return Err(AppError::Validation(errors));
        };

        let (api_key_id, tenant_id, project) = self.admit(&mut envelope).await?;

        let event = self
            .events
            .insert_activity(&NewActivityEvent {
                project_id: project.id,
                api_key_id,
                user_id: envelope.user_id,
                message,
                level,
                metadata: envelope.metadata,
            })
            .await?;

        tracing::info!(
            event_id = %event.id,
            project_id = %project.id,
            level = %event.level,
            "Activity event ingested"
        );

        self.notifications
            .dispatch(tenant_id, project.name.clone(), event.clone());

        Ok(event)
    }

    #[instrument(skip_all)]
    pub async fn ingest_llm(&self, payload: LlmEventPayload) -> AppResult<LlmEventProfile> {
        let mut errors = FieldErrors::new();
        let envelope = check_envelope(
            &mut errors,
            payload.api_key,
            payload.project,
            payload.project_name,
            payload.user_id,
            payload.metadata,
            EventKind::Llm,
        );
        let source = required_text(&mut errors, "source", payload.source, text_value);
        let query = text_value(&mut errors, "query", payload.query);
        let response = text_value(&mut errors, "response", payload.response);

        let (Some(mut envelope), Some(source), true) = (envelope, source, errors.is_empty())
        else {
            return Err(AppError::Validation(errors));
        };

        let (api_key_id, _tenant_id, project) = self.admit(&mut envelope).await?;

        let event = self
            .events
            .insert_llm(&NewLlmEvent {
                project_id: project.id,
                api_key_id,
                user_id: envelope.user_id,
                source,
                query,
                response,
                metadata: envelope.metadata,
            })
            .await?;

        tracing::info!(event_id = %event.id, project_id = %project.id, "LLM event ingested");

        Ok(event)
    }
}

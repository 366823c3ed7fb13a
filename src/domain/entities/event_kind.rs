use serde::{Deserialize, Serialize};

use super::project_kind::ProjectKind;

/// The two stored event variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Activity,
    Llm,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Activity => "activity",
            EventKind::Llm => "llm",
        }
    }

    /// Kind given to a project created implicitly by this endpoint.
    pub fn project_kind_hint(&self) -> ProjectKind {
        match self {
            EventKind::Activity => ProjectKind::Activity,
            EventKind::Llm => ProjectKind::Llm,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

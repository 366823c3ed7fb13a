use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Severity of an activity event.
///
/// Closed set: anything outside these four values is rejected at ingestion
/// rather than coerced, so level counts stay well-defined.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    sqlx::Type,
)]
#[sqlx(type_name = "event_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Debug => "debug",
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
        }
    }

    /// Upper-case label used in notification subjects.
    pub fn label(&self) -> &'static str {
        match self {
            EventLevel::Debug => "DEBUG",
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
        }
    }

    /// Levels that can trigger a notification at all.
    pub fn is_alerting(&self) -> bool {
        matches!(self, EventLevel::Warning | EventLevel::Error)
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(EventLevel::Debug),
            "info" => Ok(EventLevel::Info),
            "warning" => Ok(EventLevel::Warning),
            "error" => Ok(EventLevel::Error),
            _ => Err(format!("\"{}\" is not a valid choice.", s)),
        }
    }
}

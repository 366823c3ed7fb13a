use serde::{Deserialize, Serialize};

/// Informational project kind. It never gates which event type a project accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    #[default]
    Activity,
    Llm,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Activity => "activity",
            ProjectKind::Llm => "llm",
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activity" => Ok(ProjectKind::Activity),
            "llm" => Ok(ProjectKind::Llm),
            _ => Err(format!("Invalid project kind: {}", s)),
        }
    }
}

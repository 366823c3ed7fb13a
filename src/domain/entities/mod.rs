pub mod event_kind;
pub mod event_level;
pub mod project_kind;

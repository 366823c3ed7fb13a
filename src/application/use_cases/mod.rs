pub mod analytics;
pub mod api_key;
pub mod event;
pub mod export;
pub mod ingest;
pub mod notification;
pub mod project;

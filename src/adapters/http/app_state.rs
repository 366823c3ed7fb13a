use std::sync::Arc;
use std::time::Duration;

use crate::{
    application::use_cases::{
        analytics::{AnalyticsRepo, AnalyticsUseCases},
        api_key::{ApiKeyRepo, ApiKeyUseCases},
        event::{EventRepo, EventUseCases},
        export::ExportUseCases,
        ingest::IngestUseCases,
        notification::{EmailSender, NotificationPreferenceRepo, NotificationUseCases},
        project::{ProjectRepo, ProjectUseCases},
    },
    infra::{RateLimiterTrait, config::AppConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api_key_use_cases: Arc<ApiKeyUseCases>,
    pub project_use_cases: Arc<ProjectUseCases>,
    pub event_use_cases: Arc<EventUseCases>,
    pub ingest_use_cases: Arc<IngestUseCases>,
    pub notification_use_cases: Arc<NotificationUseCases>,
    pub analytics_use_cases: Arc<AnalyticsUseCases>,
    pub export_use_cases: Arc<ExportUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}

impl AppState {
    /// Wire every use case over one store that implements all repository ports.
    pub fn new<P>(
        config: AppConfig,
        store: Arc<P>,
        email: Arc<dyn EmailSender>,
        rate_limiter: Arc<dyn RateLimiterTrait>,
    ) -> Self
    where
        P: ApiKeyRepo
            + ProjectRepo
            + EventRepo
            + AnalyticsRepo
            + NotificationPreferenceRepo
            + 'static,
    {
        let api_keys = ApiKeyUseCases::new(store.clone() as Arc<dyn ApiKeyRepo>);
        let projects = ProjectUseCases::new(store.clone() as Arc<dyn ProjectRepo>);
        let event_repo = store.clone() as Arc<dyn EventRepo>;
        let events = EventUseCases::new(event_repo.clone(), projects.clone());
        let notifications = NotificationUseCases::new(
            store.clone() as Arc<dyn NotificationPreferenceRepo>,
            email,
            config.app_origin.to_string(),
            Duration::from_secs(config.notification_timeout_secs),
        );
        let ingest = IngestUseCases::new(
            api_keys.clone(),
            projects.clone(),
            event_repo,
            notifications.clone(),
        );
        let analytics = AnalyticsUseCases::new(
            store as Arc<dyn AnalyticsRepo>,
            projects.clone(),
            api_keys.clone(),
        );
        let export = ExportUseCases::new(events.clone(), analytics.clone());

        Self {
            config: Arc::new(config),
            api_key_use_cases: Arc::new(api_keys),
            project_use_cases: Arc::new(projects),
            event_use_cases: Arc::new(events),
            ingest_use_cases: Arc::new(ingest),
            notification_use_cases: Arc::new(notifications),
            analytics_use_cases: Arc::new(analytics),
            export_use_cases: Arc::new(export),
            rate_limiter,
        }
    }
}

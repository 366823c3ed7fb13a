//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires a complete `AppState` to the in-memory store,
//! email sender and rate limiter, and hands those back for assertions.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use axum_test::TestServer;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, routes},
    application::{jwt, use_cases::notification::EmailSender},
    infra::{RateLimiterTrait, config::AppConfig},
    test_utils::{InMemoryEmailSender, InMemoryPersistence, InMemoryRateLimiter},
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        database_max_connections: 1,
        database_acquire_timeout_secs: 1,
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        redis_url: String::new(),
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 600,
        rate_limit_per_api_key: 1200,
        trust_proxy: false,
        resend_api_key: SecretString::new("re_test".into()),
        email_from: "alerts@logledger.test".to_string(),
        notification_timeout_secs: 1,
        log_file: None,
    }
}

/// Bearer header value for a tenant session.
pub fn bearer_for(tenant_id: Uuid) -> String {
    let token = jwt::issue(
        tenant_id,
        &SecretString::new(TEST_JWT_SECRET.into()),
        time::Duration::hours(1),
    )
    .expect("Failed to issue test token");
    format!("Bearer {token}")
}

/// A built state plus handles on its in-memory collaborators.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryPersistence>,
    pub email: Arc<InMemoryEmailSender>,
}

impl TestApp {
    /// The `/api` routes without the per-IP middleware, which needs a real socket.
    pub fn router(&self) -> Router<()> {
        routes::router(self.state.clone()).with_state(self.state.clone())
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }
}

pub struct TestAppStateBuilder {
    store: InMemoryPersistence,
    rate_limiter: Arc<dyn RateLimiterTrait>,
    email_sender: Option<Arc<dyn EmailSender>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: InMemoryPersistence::new(),
            rate_limiter: Arc::new(InMemoryRateLimiter::permissive()),
            email_sender: None,
        }
    }

    pub fn with_store(mut self, store: InMemoryPersistence) -> Self {
        self.store = store;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Replaces the in-memory sender. `TestApp::email` then records nothing.
    pub fn with_email_sender(mut self, email_sender: Arc<dyn EmailSender>) -> Self {
        self.email_sender = Some(email_sender);
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(self.store);
        let email = Arc::new(InMemoryEmailSender::new());
        let sender: Arc<dyn EmailSender> = self.email_sender.unwrap_or_else(|| email.clone());
        let state = AppState::new(test_config(), store.clone(), sender, self.rate_limiter);
        TestApp {
            state,
            store,
            email,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

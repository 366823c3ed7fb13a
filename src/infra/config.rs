use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use super::InfraError;

pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    /// HS256 secret shared with the service that issues dashboard access tokens.
    pub jwt_secret: SecretString,
    /// Dashboard origin, used for links in notification emails.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_api_key: u64,
    /// Whether to trust X-Forwarded-For headers. Only enable behind a reverse proxy.
    pub trust_proxy: bool,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub notification_timeout_secs: u64,
    /// Optional path for the JSON log layer.
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 10);
        let database_acquire_timeout_secs: u64 =
            get_env_default("DATABASE_ACQUIRE_TIMEOUT_SECS", 5);

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );

        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let app_origin: Url = get_env_default(
            "APP_ORIGIN",
            String::from("http://localhost:3000"),
        )
        .parse()
        .map_err(|_| InfraError::ConfigInvalid { var: "APP_ORIGIN" })?;
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 600);
        let rate_limit_per_api_key: u64 = get_env_default("RATE_LIMIT_PER_API_KEY", 1200);
        // Default to false - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let resend_api_key = SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let email_from: String =
            get_env_default("EMAIL_FROM", "logledger <alerts@logledger.dev>".to_string());
        let notification_timeout_secs: u64 = get_env_default("NOTIFICATION_TIMEOUT_SECS", 10);
        let log_file: Option<String> = std::env::var("LOG_FILE").ok().filter(|s| !s.is_empty());

        Ok(Self {
            database_url,
            database_max_connections,
            database_acquire_timeout_secs,
            bind_addr,
            jwt_secret,
            app_origin,
            cors_origin,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_api_key,
            trust_proxy,
            resend_api_key,
            email_from,
            notification_timeout_secs,
            log_file,
        })
    }
}

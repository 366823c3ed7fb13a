use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod http_client;
pub mod rate_limit;
pub mod setup;

pub use error::InfraError;
pub use rate_limit::RateLimiterTrait;

pub async fn postgres_persistence(
    config: &config::AppConfig,
) -> Result<PostgresPersistence, InfraError> {
    let pool = init_db(config).await?;
    Ok(PostgresPersistence::new(pool))
}

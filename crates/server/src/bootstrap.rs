use std::sync::Arc;

use sitequote_core::config::{AppConfig, ConfigError};
use sitequote_db::{connect_from_config, migrations, DbPool, QuoteStore, SqlQuoteStore};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub store: Arc<dyn QuoteStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Opens the database named by an already loaded configuration and migrates it.
pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        listen_address = %config.listen_address(),
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    let applied = migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        applied = applied.len(),
        "database migrations applied"
    );

    let store: Arc<dyn QuoteStore> = Arc::new(SqlQuoteStore::new(db_pool.clone()));
    Ok(Application { config, db_pool, store })
}

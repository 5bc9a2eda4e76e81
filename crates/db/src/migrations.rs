use sqlx::migrate::{Migrate, MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationSummary {
    pub version: i64,
    pub description: String,
}

/// Applies every pending migration and returns the ones this run applied,
/// in version order. Empty when the schema was already current.
pub async fn run_pending(pool: &DbPool) -> Result<Vec<MigrationSummary>, MigrateError> {
    let before = applied_versions(pool).await?;
    MIGRATOR.run(pool).await?;

    Ok(MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .filter(|migration| !before.contains(&migration.version))
        .map(|migration| MigrationSummary {
            version: migration.version,
            description: migration.description.to_string(),
        })
        .collect())
}

pub async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>, MigrateError> {
    let mut connection = pool.acquire().await?;
    connection.ensure_migrations_table().await?;
    let applied = connection.list_applied_migrations().await?;
    Ok(applied.into_iter().map(|migration| migration.version).collect())
}

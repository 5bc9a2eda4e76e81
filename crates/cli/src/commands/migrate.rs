use serde_json::{json, Value};
use sitequote_core::config::{AppConfig, LoadOptions};
use sitequote_db::connect_from_config;
use sitequote_db::migrations::{self, MigrationSummary};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let applied = migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let current = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>((applied, current))
    });

    match result {
        Ok((applied, current)) => CommandResult::success_with_data(
            "migrate",
            summary_message(&applied, &config.database.url),
            Some(report(&applied, &current)),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

fn summary_message(applied: &[MigrationSummary], database_url: &str) -> String {
    match applied {
        [] => format!("schema at `{database_url}` is already current"),
        applied => {
            let versions = applied
                .iter()
                .map(|migration| migration.version.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("applied migration(s) {versions} to `{database_url}`")
        }
    }
}

fn report(applied: &[MigrationSummary], current: &[i64]) -> Value {
    let applied: Vec<Value> = applied
        .iter()
        .map(|migration| {
            json!({ "version": migration.version, "description": migration.description })
        })
        .collect();
    json!({ "applied": applied, "currentVersions": current })
}

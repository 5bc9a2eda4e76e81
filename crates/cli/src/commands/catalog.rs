use sitequote_core::Catalog;

use crate::commands::CommandResult;

/// Option table for one plan tier.
pub fn run(plan_key: &str) -> CommandResult {
    let entry = match Catalog::standard().for_key(plan_key) {
        Ok(entry) => entry,
        Err(error) => return CommandResult::failure("catalog", error.code(), error.to_string(), 2),
    };

    match serde_json::to_value(entry) {
        Ok(data) => CommandResult::success_with_data(
            "catalog",
            format!("{} plan catalog", entry.plan),
            Some(data),
        ),
        Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 3),
    }
}

//! Replays a scripted selection against a fresh draft and reports its price.
//!
//! Input file shape:
//!
//! ```json
//! { "planType": "basic", "commands": [{ "op": "set_deadline", "weeks": 2 }] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sitequote_core::{
    Catalog, PlanType, PricingResult, SelectionCommand, SelectionManager, SelectionState,
};

use crate::commands::CommandResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceScript {
    plan_type: String,
    #[serde(default)]
    commands: Vec<SelectionCommand>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceReport {
    draft: SelectionState,
    pricing: PricingResult,
    /// Commands that were accepted but changed nothing, by position.
    ignored: Vec<usize>,
}

pub fn run(path: &Path) -> CommandResult {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "input_read",
                format!("could not read `{}`: {error}", path.display()),
                2,
            );
        }
    };
    let script: PriceScript = match serde_json::from_str(&raw) {
        Ok(script) => script,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "input_parse",
                format!("could not parse `{}`: {error}", path.display()),
                2,
            );
        }
    };

    match price_script(script) {
        Ok(report) => {
            let message = format!(
                "{} plan priced at {} {}",
                report.draft.plan, report.pricing.total, report.pricing.trace.currency
            );
            CommandResult::success_with_data("price", message, serde_json::to_value(&report).ok())
        }
        Err((error_class, message)) => CommandResult::failure("price", error_class, message, 4),
    }
}

fn price_script(script: PriceScript) -> Result<PriceReport, (&'static str, String)> {
    let plan = script
        .plan_type
        .parse::<PlanType>()
        .map_err(|error| (error.code(), error.to_string()))?;
    let manager = SelectionManager::new(Catalog::standard());
    let mut draft = manager.new_draft(plan).map_err(|error| (error.code(), error.to_string()))?;

    let mut ignored = Vec::new();
    for (index, command) in script.commands.into_iter().enumerate() {
        let op = command.name();
        let outcome = manager
            .apply(&mut draft, command)
            .map_err(|error| (error.code(), format!("command #{index} ({op}): {error}")))?;
        if !outcome.applied {
            ignored.push(index);
        }
    }

    let pricing = manager.price(&draft).map_err(|error| (error.code(), error.to_string()))?;
    Ok(PriceReport { draft, pricing, ignored })
}

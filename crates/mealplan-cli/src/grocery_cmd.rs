//! `mealplan grocery <plan.json>`: aggregate a plan file offline against
//! the local recipe directory.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use mealplan_core::grocery::{GroceryRequest, GroceryResponse, aggregate};
use mealplan_core::types::PlanEntry;

use crate::config::MealplanConfig;

/// A plan file is either a bare array of days or any object with a `plan`
/// field (a grocery request or a saved planner response).
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Days(Vec<PlanEntry>),
    Wrapped(GroceryRequest),
}

pub fn parse_plan(text: &str) -> Result<Vec<PlanEntry>> {
    let doc: PlanDocument = serde_json::from_str(text)
        .context("plan must be a JSON array of days or an object with a \"plan\" field")?;
    Ok(match doc {
        PlanDocument::Days(days) => days,
        PlanDocument::Wrapped(request) => request.plan,
    })
}

/// Execute `mealplan grocery`: print the grocery list as JSON.
pub async fn run_grocery(config: &MealplanConfig, plan_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(plan_path)
        .with_context(|| format!("failed to read plan file {}", plan_path.display()))?;
    let plan = parse_plan(&text)
        .with_context(|| format!("invalid plan file {}", plan_path.display()))?;

    let store = config.load_store()?;
    let resolver = config.load_resolver()?;
    let grocery_list = aggregate(&plan, &store, &resolver)
        .await
        .context("grocery aggregation failed")?;

    let output = serde_json::to_string_pretty(&GroceryResponse { grocery_list })?;
    println!("{output}");
    Ok(())
}

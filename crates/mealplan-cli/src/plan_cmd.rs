//! `mealplan plan`: build a plan and grocery list without any services
//! running, using the local recipe directory and ingredient table.

use std::sync::Arc;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use mealplan_core::planner::Profile;
use mealplan_core::recipe::RecipeIndex;

use crate::config::MealplanConfig;
use crate::planner_service::{LocalGrocery, PlanResponse, plan_meals};

pub async fn offline_plan(
    config: &MealplanConfig,
    profile: &Profile,
    seed: Option<u64>,
) -> Result<PlanResponse> {
    let store = Arc::new(config.load_store()?);
    if store.is_empty() {
        tracing::warn!(
            dir = %config.recipes_dir.display(),
            "no recipes found; every meal will be empty"
        );
    }
    let resolver = Arc::new(config.load_resolver()?);
    let index = RecipeIndex::build(store.clone());
    let grocery = LocalGrocery::new(store, resolver);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    Ok(plan_meals(profile, &index, &grocery, &mut rng).await)
}

/// Execute `mealplan plan`: print the plan response as JSON.
pub async fn run_plan(config: &MealplanConfig, profile: &Profile, seed: Option<u64>) -> Result<()> {
    let response = offline_plan(config, profile, seed).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

//! Plan building: one retrieval per day and meal slot, avoiding repeats.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::retriever::RecipeRetriever;
use crate::recipe::{ANY_REGION, RecipeFilters, RecipeQuery};
use crate::types::{PlanEntry, PlannedMeal, Recipe};

/// Meal slots filled for each day, in order.
pub const MEAL_SLOTS: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// Candidates requested per slot.
pub const CANDIDATES_PER_SLOT: usize = 6;

/// Who the plan is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_diet")]
    pub diet: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Ingredient names to keep out of the plan (case-insensitive substring
    /// match against recipe ingredient items).
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            diet: default_diet(),
            region: default_region(),
            allergies: Vec::new(),
            days: default_days(),
            servings: default_servings(),
            budget: None,
            spice_level: None,
        }
    }
}

fn default_diet() -> String {
    "veg".to_string()
}

fn default_region() -> String {
    ANY_REGION.to_string()
}

fn default_days() -> u32 {
    3
}

fn default_servings() -> u32 {
    2
}

impl Profile {
    /// Retrieval query for one meal slot: the slot name plus the region
    /// unless the region is unrestricted.
    pub fn query_for(&self, meal_name: &str) -> RecipeQuery {
        let region = if self.region.is_empty() || self.region == ANY_REGION {
            ""
        } else {
            self.region.as_str()
        };
        RecipeQuery {
            query: format!("{meal_name} {region}").trim().to_string(),
            k: CANDIDATES_PER_SLOT,
            filters: RecipeFilters {
                diet: Some(self.diet.clone()),
                region: Some(self.region.clone()),
            },
        }
    }

    fn is_allergic_to(&self, recipe: &Recipe) -> bool {
        if self.allergies.is_empty() {
            return false;
        }
        let allergens: Vec<String> = self
            .allergies
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        recipe.ingredients.iter().any(|line| {
            let item = line.item.to_lowercase();
            allergens.iter().any(|a| item.contains(a.as_str()))
        })
    }
}

/// Build a plan of `max(1, profile.days)` days.
///
/// For each slot the candidates are shuffled and the first one not used
/// earlier in the plan is chosen; if every candidate was already used, the
/// first candidate is repeated. A retrieval failure or an empty candidate
/// list leaves the slot without a recipe and records why in `note`.
pub async fn build_plan<R, G>(profile: &Profile, retriever: &R, rng: &mut G) -> Vec<PlanEntry>
where
    R: RecipeRetriever + ?Sized,
    G: Rng + ?Sized,
{
    let days = profile.days.max(1);
    let mut used: HashSet<String> = HashSet::new();
    let mut plan = Vec::with_capacity(days as usize);

    for day in 1..=days {
        let mut meals = Vec::with_capacity(MEAL_SLOTS.len());
        for meal_name in MEAL_SLOTS {
            let query = profile.query_for(meal_name);
            let mut candidates = match retriever.retrieve(&query).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(day, meal = meal_name, error = %err, "recipe retrieval failed");
                    meals.push(PlannedMeal::placeholder(
                        meal_name,
                        format!("recipe service error: {err}"),
                    ));
                    continue;
                }
            };
            candidates.retain(|c| !c.id.is_empty() && !profile.is_allergic_to(c));
            candidates.shuffle(rng);

            let chosen = candidates
                .iter()
                .find(|c| !used.contains(&c.id))
                .or_else(|| candidates.first());

            match chosen {
                Some(recipe) => {
                    used.insert(recipe.id.clone());
                    meals.push(PlannedMeal {
                        meal_name: meal_name.to_string(),
                        recipe_id: Some(recipe.id.clone()),
                        title: recipe.title.clone(),
                        cook_time_min: recipe.cook_time_min,
                        note: None,
                    });
                }
                None => meals.push(PlannedMeal::placeholder(meal_name, "no recipe found")),
            }
        }
        plan.push(PlanEntry { day, meals });
    }

    tracing::info!(days, recipes = used.len(), "built meal plan");
    plan
}

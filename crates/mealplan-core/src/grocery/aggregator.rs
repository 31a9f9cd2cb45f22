//! Grocery list aggregation.
//!
//! Walks a meal plan day by day and meal by meal, resolves every ingredient
//! line of every planned recipe to a canonical name, converts what it can to
//! grams, and merges the results into one list sorted by item.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::{StreamExt, TryStreamExt};
use thiserror::Error;

use crate::ingredient::{Conversion, Resolver};
use crate::recipe::{LookupError, RecipeLookup};
use crate::types::{AggregationEntry, Instance, PlanEntry, Recipe};

/// Upper bound on recipe lookups in flight for one aggregation call.
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Errors that abort an aggregation call.
///
/// Missing recipes and unconvertible quantities are not errors; only a
/// recipe source that cannot answer is, and then no partial list is
/// produced.
#[derive(Debug, Error)]
pub enum GroceryError {
    #[error("recipe source unavailable: {0}")]
    SourceUnavailable(#[source] LookupError),

    #[error("recipe source unavailable while looking up {recipe_id:?}: {source}")]
    UpstreamUnavailable {
        recipe_id: String,
        #[source]
        source: LookupError,
    },
}

/// Running totals for one canonical item.
#[derive(Debug, Default)]
struct Tally {
    grams: f64,
    has_grams: bool,
    count: u32,
    instances: Vec<Instance>,
}

impl Tally {
    fn record(&mut self, conversion: Conversion, instance: Instance) {
        match conversion {
            Conversion::Converted(grams) => {
                self.grams += grams;
                self.has_grams = true;
            }
            Conversion::Unknown => self.count += 1,
        }
        self.instances.push(instance);
    }

    fn into_entry(self, item: String) -> AggregationEntry {
        AggregationEntry {
            item,
            total_grams: self.has_grams.then(|| round2(self.grams)),
            count: self.count,
            instances: self.instances,
        }
    }
}

/// Aggregate a plan into a grocery list, fetching recipes through `lookup`.
///
/// The source is checked first, so an empty recipe directory fails even for
/// an empty plan. Distinct recipe ids are then looked up concurrently and
/// the results replayed in plan order, so `instances` never depend on
/// completion order. Any lookup failure abandons the whole call.
pub async fn aggregate<L>(
    plan: &[PlanEntry],
    lookup: &L,
    resolver: &Resolver,
) -> Result<Vec<AggregationEntry>, GroceryError>
where
    L: RecipeLookup + ?Sized,
{
    lookup
        .ensure_available()
        .await
        .map_err(GroceryError::SourceUnavailable)?;

    let ids = planned_recipe_ids(plan);

    let fetched: Vec<(String, Option<Recipe>)> = futures::stream::iter(ids)
        .map(|id| async move {
            match lookup.lookup(&id).await {
                Ok(recipe) => Ok((id, recipe)),
                Err(source) => Err(GroceryError::UpstreamUnavailable {
                    recipe_id: id,
                    source,
                }),
            }
        })
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .try_collect()
        .await?;

    let recipes: HashMap<String, Recipe> = fetched
        .into_iter()
        .filter_map(|(id, recipe)| recipe.map(|r| (id, r)))
        .collect();

    Ok(aggregate_with(plan, &recipes, resolver))
}

/// Aggregate a plan against recipes already in memory.
///
/// Meals without a recipe id, and ids absent from `recipes`, contribute
/// nothing.
pub fn aggregate_with(
    plan: &[PlanEntry],
    recipes: &HashMap<String, Recipe>,
    resolver: &Resolver,
) -> Vec<AggregationEntry> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();

    for day in plan {
        for meal in &day.meals {
            let Some(recipe_id) = meal.recipe_id() else {
                continue;
            };
            let Some(recipe) = recipes.get(recipe_id) else {
                tracing::debug!(recipe_id, day = day.day, "recipe not found, skipping");
                continue;
            };

            for line in &recipe.ingredients {
                let key = resolver.canonicalize(&line.item);
                let conversion = resolver.quantity_to_grams(&line.item, &line.qty);
                tallies.entry(key).or_default().record(
                    conversion,
                    Instance {
                        recipe_id: recipe_id.to_owned(),
                        raw_qty: line.qty.clone(),
                    },
                );
            }
        }
    }

    let entries: Vec<AggregationEntry> = tallies
        .into_iter()
        .map(|(item, tally)| tally.into_entry(item))
        .collect();
    tracing::debug!(items = entries.len(), days = plan.len(), "aggregated grocery list");
    entries
}

/// Distinct non-empty recipe ids in plan order.
fn planned_recipe_ids(plan: &[PlanEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    plan.iter()
        .flat_map(|day| day.meals.iter())
        .filter_map(|meal| meal.recipe_id())
        .filter(|id| seen.insert(*id))
        .map(str::to_owned)
        .collect()
}

/// Round to 2 decimals, exact halves to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

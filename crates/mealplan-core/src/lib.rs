//! Meal planning core: ingredient resolution, grocery aggregation, recipe
//! retrieval, and plan building.

pub mod grocery;
pub mod ingredient;
pub mod planner;
pub mod recipe;
pub mod types;

pub use grocery::{GroceryError, aggregate, aggregate_with};
pub use ingredient::{Conversion, IngredientTable, Resolver};
pub use planner::{Profile, RecipeRetriever, build_plan};
pub use recipe::{RecipeIndex, RecipeLookup, RecipeStore};
pub use types::{AggregationEntry, Instance, PlanEntry, PlannedMeal, RawIngredientLine, Recipe};

//! Meal plan building.

pub mod builder;
pub mod retriever;

pub use builder::{CANDIDATES_PER_SLOT, MEAL_SLOTS, Profile, build_plan};
pub use retriever::{RecipeRetriever, RetrievalError};

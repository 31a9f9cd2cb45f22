//! Recipes: the lookup capability, the directory store, and keyword search.

pub mod lookup;
pub mod search;
pub mod store;

pub use lookup::{LookupError, RecipeLookup};
pub use search::{ANY_REGION, RecipeFilters, RecipeIndex, RecipeQuery, RecipesResponse};
pub use store::RecipeStore;

//! Where the planner gets its candidate recipes.

use async_trait::async_trait;
use thiserror::Error;

use crate::recipe::{RecipeIndex, RecipeQuery};
use crate::types::Recipe;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{0}")]
    Unavailable(String),
}

/// Return up to `query.k` candidate recipes for a meal slot.
#[async_trait]
pub trait RecipeRetriever: Send + Sync {
    async fn retrieve(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, RetrievalError>;
}

/// In-process retrieval over a local index.
#[async_trait]
impl RecipeRetriever for RecipeIndex {
    async fn retrieve(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, RetrievalError> {
        Ok(self.search(query))
    }
}

const _: () = {
    fn _assert_object_safe(_: &dyn RecipeRetriever) {}
};

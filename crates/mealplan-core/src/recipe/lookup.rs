//! The `RecipeLookup` trait: how the grocery aggregator fetches recipes.
//!
//! Implemented by the on-disk [`super::RecipeStore`], by plain maps (tests
//! and offline use), and by the HTTP client in the CLI crate.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Recipe;

/// Failure of the recipe source itself, as opposed to a missing recipe.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to read recipe file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode recipe file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("recipe source unavailable: {0}")]
    Unavailable(String),
}

/// Fetch a recipe by id.
///
/// `Ok(None)` means the id is unknown and is not an error. `Err` means the
/// source could not answer at all.
#[async_trait]
pub trait RecipeLookup: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError>;

    /// Fail up front when the source cannot answer any lookup, e.g. a
    /// recipe directory with nothing in it.
    async fn ensure_available(&self) -> Result<(), LookupError> {
        Ok(())
    }
}

#[async_trait]
impl RecipeLookup for HashMap<String, Recipe> {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        Ok(self.get(id).cloned())
    }
}

#[async_trait]
impl<T: RecipeLookup + ?Sized> RecipeLookup for Arc<T> {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        (**self).lookup(id).await
    }

    async fn ensure_available(&self) -> Result<(), LookupError> {
        (**self).ensure_available().await
    }
}

// Compile-time assertion: RecipeLookup must be usable as `dyn RecipeLookup`.
const _: () = {
    fn _assert_object_safe(_: &dyn RecipeLookup) {}
};

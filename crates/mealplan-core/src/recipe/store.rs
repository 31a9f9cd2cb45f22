//! Directory-backed recipe store.
//!
//! Every `*.json` file in the recipes directory holds one recipe document.
//! Files are read once at startup, in file-name order, and indexed by the
//! `id` field inside the document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::lookup::{LookupError, RecipeLookup};
use crate::types::Recipe;

/// In-memory recipes loaded from a directory.
#[derive(Debug, Clone, Default)]
pub struct RecipeStore {
    /// Recipes in load order.
    recipes: Vec<Recipe>,
    by_id: HashMap<String, usize>,
    source: Option<PathBuf>,
}

impl RecipeStore {
    /// Load every `*.json` recipe in `dir`.
    ///
    /// A missing directory yields an empty store. An unreadable or invalid
    /// document fails the whole load.
    pub fn load(dir: &Path) -> Result<Self, LookupError> {
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "recipe directory not found");
            return Ok(Self {
                source: Some(dir.to_path_buf()),
                ..Self::default()
            });
        }

        let read_dir = std::fs::read_dir(dir).map_err(|source| LookupError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| LookupError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut recipes = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|source| LookupError::Io {
                path: path.clone(),
                source,
            })?;
            let recipe: Recipe = serde_json::from_str(&content)
                .map_err(|source| LookupError::Decode { path, source })?;
            recipes.push(recipe);
        }

        let mut store = Self::from_recipes(recipes);
        store.source = Some(dir.to_path_buf());
        tracing::info!(dir = %dir.display(), recipes = store.len(), "loaded recipe store");
        Ok(store)
    }

    /// Build a store from recipes in order. A repeated id keeps the first
    /// position and the last document.
    pub fn from_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let mut store = Self::default();
        for recipe in recipes {
            match store.by_id.get(&recipe.id) {
                Some(&idx) => store.recipes[idx] = recipe,
                None => {
                    store.by_id.insert(recipe.id.clone(), store.recipes.len());
                    store.recipes.push(recipe);
                }
            }
        }
        store
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.by_id.get(id).map(|&idx| &self.recipes[idx])
    }

    /// Recipes in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[async_trait]
impl RecipeLookup for RecipeStore {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        self.ensure_available().await?;
        Ok(self.get(id).cloned())
    }

    /// An empty store cannot answer any lookup: the recipe source is
    /// treated as unavailable rather than every id as unknown.
    async fn ensure_available(&self) -> Result<(), LookupError> {
        if !self.is_empty() {
            return Ok(());
        }
        let location = self
            .source
            .as_ref()
            .map_or_else(|| "recipe store".to_string(), |p| p.display().to_string());
        Err(LookupError::Unavailable(format!(
            "no recipes found in {location}"
        )))
    }
}

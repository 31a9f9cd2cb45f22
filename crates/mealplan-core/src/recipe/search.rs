//! Keyword retrieval over the recipe store.
//!
//! Each recipe is indexed by the words of its title, summary, ingredient
//! names, and tags. A query ranks recipes by how many distinct query words
//! they contain; ties keep store order. Diet and region filters are applied
//! to the ranked candidates afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::store::RecipeStore;
use crate::types::Recipe;

/// Region value meaning "no region preference".
pub const ANY_REGION: &str = "All";

/// Metadata filters for a recipe query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Request body of the recipe retrieval endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeQuery {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub filters: RecipeFilters,
}

fn default_k() -> usize {
    5
}

/// Response body of the recipe retrieval endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

/// Word index over a [`RecipeStore`].
#[derive(Debug, Clone)]
pub struct RecipeIndex {
    store: Arc<RecipeStore>,
    /// Word sets, parallel to `store.iter()`.
    documents: Vec<HashSet<String>>,
}

impl RecipeIndex {
    pub fn build(store: Arc<RecipeStore>) -> Self {
        let documents = store.iter().map(document_words).collect();
        Self { store, documents }
    }

    pub fn store(&self) -> &RecipeStore {
        &self.store
    }

    /// Up to `n` recipes ranked by word overlap with `query`.
    pub fn rank(&self, query: &str, n: usize) -> Vec<&Recipe> {
        let words: HashSet<String> = tokenize(query).collect();
        let mut scored: Vec<(usize, usize)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| (words.iter().filter(|w| doc.contains(*w)).count(), idx))
            .collect();
        // Stable sort: equal scores keep store order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let recipes: Vec<&Recipe> = self.store.iter().collect();
        scored
            .into_iter()
            .take(n)
            .map(|(_, idx)| recipes[idx])
            .collect()
    }

    /// Answer a retrieval query.
    ///
    /// Ranks `2k` candidates, keeps those passing the filters (at most `k`),
    /// and falls back to the first `k` unfiltered candidates when the
    /// filters reject all of them.
    pub fn search(&self, query: &RecipeQuery) -> Vec<Recipe> {
        let candidates = self.rank(&query.query, query.k.saturating_mul(2));

        let filtered: Vec<Recipe> = candidates
            .iter()
            .filter(|r| passes_filters(r, &query.filters))
            .take(query.k)
            .map(|r| (*r).clone())
            .collect();
        if !filtered.is_empty() {
            return filtered;
        }

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|r| !r.id.is_empty() && seen.insert(r.id.clone()))
            .take(query.k)
            .cloned()
            .collect()
    }
}

/// A filter only rejects when both it and the recipe field are present and
/// differ (case-insensitively). Region [`ANY_REGION`] matches everything.
fn passes_filters(recipe: &Recipe, filters: &RecipeFilters) -> bool {
    let differs = |wanted: Option<&str>, actual: Option<&str>| match (wanted, actual) {
        (Some(w), Some(a)) if !w.is_empty() && !a.is_empty() => !w.eq_ignore_ascii_case(a),
        _ => false,
    };
    let region = filters
        .region
        .as_deref()
        .filter(|r| !r.eq_ignore_ascii_case(ANY_REGION));

    !differs(filters.diet.as_deref(), recipe.diet.as_deref())
        && !differs(region, recipe.region.as_deref())
}

fn document_words(recipe: &Recipe) -> HashSet<String> {
    let mut words: HashSet<String> = HashSet::new();
    let fields = recipe
        .title
        .iter()
        .chain(recipe.one_line_summary.iter())
        .chain(recipe.ingredients.iter().map(|i| &i.item))
        .chain(recipe.tags.iter());
    for field in fields {
        words.extend(tokenize(field));
    }
    words
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

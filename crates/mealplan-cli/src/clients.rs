//! HTTP clients for talking to the recipe and grocery services.
//!
//! Each client wraps a shared `reqwest::Client` (which carries the request
//! timeout) and a base URL, and implements the core capability trait the
//! caller needs.

use async_trait::async_trait;
use serde::Serialize;

use mealplan_core::grocery::GroceryResponse;
use mealplan_core::planner::{RecipeRetriever, RetrievalError};
use mealplan_core::recipe::{LookupError, RecipeLookup, RecipeQuery, RecipesResponse};
use mealplan_core::types::{AggregationEntry, PlanEntry, Recipe};

use crate::planner_service::GroceryBackend;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// `{base_url}/recipes/{id}` with `id` percent-encoded as one path segment.
fn recipe_url(base_url: &str, id: &str) -> Result<reqwest::Url, LookupError> {
    let base = endpoint(base_url, "/recipes");
    let mut url = reqwest::Url::parse(&base)
        .map_err(|e| LookupError::Unavailable(format!("invalid recipe service URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| LookupError::Unavailable(format!("recipe service URL {base} cannot take a path")))?
        .push(id);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Recipe service
// ---------------------------------------------------------------------------

/// Candidate retrieval via `POST /a2a/get_recipes`.
#[derive(Debug, Clone)]
pub struct HttpRecipeRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecipeRetriever {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl RecipeRetriever for HttpRecipeRetriever {
    async fn retrieve(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, RetrievalError> {
        let url = endpoint(&self.base_url, "/a2a/get_recipes");
        let response = self
            .client
            .post(&url)
            .json(query)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let body: RecipesResponse = response.json().await.map_err(|e| {
            RetrievalError::Unavailable(format!("invalid response from {url}: {e}"))
        })?;
        Ok(body.recipes)
    }
}

/// Recipe lookup via `GET /recipes/{id}`; a 404 is an unknown id.
#[derive(Debug, Clone)]
pub struct HttpRecipeLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecipeLookup {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl RecipeLookup for HttpRecipeLookup {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        let url = recipe_url(&self.base_url, id)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(recipe_id = id, "recipe service has no such recipe");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!("{url} returned {status}")));
        }

        let recipe: Recipe = response
            .json()
            .await
            .map_err(|e| LookupError::Unavailable(format!("invalid response from {url}: {e}")))?;
        Ok(Some(recipe))
    }
}

// ---------------------------------------------------------------------------
// Grocery service
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlanBody<'a> {
    plan: &'a [PlanEntry],
}

/// Grocery aggregation via `POST /a2a/generate_grocery_list`.
#[derive(Debug, Clone)]
pub struct HttpGroceryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGroceryClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl GroceryBackend for HttpGroceryClient {
    async fn grocery_list(&self, plan: &[PlanEntry]) -> anyhow::Result<Vec<AggregationEntry>> {
        let url = endpoint(&self.base_url, "/a2a/generate_grocery_list");
        let response = self
            .client
            .post(&url)
            .json(&PlanBody { plan })
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("request to {url} failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("{url} returned {status}: {detail}");
        }

        let body: GroceryResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("invalid response from {url}: {e}"))?;
        Ok(body.grocery_list)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;

    use mealplan_core::ingredient::{AliasPolicy, IngredientTable, Resolver};
    use mealplan_core::recipe::{RecipeFilters, RecipeIndex, RecipeStore};
    use mealplan_core::types::{PlannedMeal, RawIngredientLine};

    use super::*;
    use crate::{grocery_service, recipe_service};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A base URL nothing is listening on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn recipes() -> Vec<Recipe> {
        let mut dosa = Recipe::new(
            "r001",
            vec![
                RawIngredientLine::new("Rice", "1 cup"),
                RawIngredientLine::new("urad dal", "1/2 cup"),
            ],
        );
        dosa.title = Some("Masala Dosa".into());
        dosa.diet = Some("veg".into());
        let pulao = Recipe::new("r002", vec![RawIngredientLine::new("raw rice", "2 cups")]);
        vec![dosa, pulao]
    }

    async fn recipe_service_url() -> String {
        let store = RecipeStore::from_recipes(recipes());
        spawn(recipe_service::build_router(Arc::new(RecipeIndex::build(
            Arc::new(store),
        ))))
        .await
    }

    fn resolver() -> Arc<Resolver> {
        let table = IngredientTable::from_reader(
            "canonical_name,aliases,grams_per_cup\nrice,raw rice,180\n".as_bytes(),
            AliasPolicy::FirstMatch,
        )
        .unwrap();
        Arc::new(Resolver::new(Arc::new(table)))
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8001/", "/recipes/r001"),
            "http://localhost:8001/recipes/r001"
        );
        assert_eq!(
            endpoint("http://localhost:8001", "/health"),
            "http://localhost:8001/health"
        );
    }

    #[tokio::test]
    async fn lookup_finds_recipe_and_maps_404_to_none() {
        let lookup = HttpRecipeLookup::new(client(), &recipe_service_url().await);

        let found = lookup.lookup("r001").await.unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("Masala Dosa"));
        assert_eq!(found.ingredients.len(), 2);

        assert!(lookup.lookup("r999").await.unwrap().is_none());
    }

    #[test]
    fn recipe_url_escapes_id() {
        let url = recipe_url("http://localhost:8001/", "r001#nope").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/recipes/r001%23nope");
        let url = recipe_url("http://localhost:8001", "r001?x=1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/recipes/r001%3Fx=1");
        assert!(recipe_url("not a url", "r001").is_err());
    }

    #[tokio::test]
    async fn lookup_does_not_let_id_rewrite_the_path() {
        let lookup = HttpRecipeLookup::new(client(), &recipe_service_url().await);

        assert!(lookup.lookup("r001#nope").await.unwrap().is_none());
        assert!(lookup.lookup("r001?x=1").await.unwrap().is_none());
        assert!(lookup.lookup("r001/extra").await.unwrap().is_none());
        assert!(lookup.lookup("r001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lookup_against_dead_service_is_unavailable() {
        let lookup = HttpRecipeLookup::new(client(), &dead_url().await);
        let err = lookup.lookup("r001").await.unwrap_err();
        assert!(matches!(err, LookupError::Unavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn retriever_returns_ranked_recipes() {
        let retriever = HttpRecipeRetriever::new(client(), &recipe_service_url().await);
        let query = RecipeQuery {
            query: "dosa".into(),
            k: 1,
            filters: RecipeFilters::default(),
        };
        let recipes = retriever.retrieve(&query).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].id, "r001");
    }

    #[tokio::test]
    async fn retriever_against_dead_service_errors() {
        let retriever = HttpRecipeRetriever::new(client(), &dead_url().await);
        let query = RecipeQuery {
            query: "lunch".into(),
            k: 6,
            filters: RecipeFilters::default(),
        };
        assert!(retriever.retrieve(&query).await.is_err());
    }

    #[tokio::test]
    async fn grocery_client_round_trips_plan() {
        let catalog: HashMap<String, Recipe> =
            recipes().into_iter().map(|r| (r.id.clone(), r)).collect();
        let url = spawn(grocery_service::build_router(Arc::new(catalog), resolver())).await;
        let grocery = HttpGroceryClient::new(client(), &url);

        let plan = vec![PlanEntry {
            day: 1,
            meals: vec![
                PlannedMeal::new("breakfast", Some("r001")),
                PlannedMeal::new("lunch", Some("r002")),
                PlannedMeal::new("dinner", None),
            ],
        }];
        let list = grocery.grocery_list(&plan).await.unwrap();

        let items: Vec<&str> = list.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, ["rice", "urad dal"]);
        assert_eq!(list[0].total_grams, Some(540.0));
        assert_eq!(list[1].total_grams, None);
        assert_eq!(list[1].count, 1);
    }

    #[tokio::test]
    async fn grocery_client_surfaces_service_errors() {
        let empty = Arc::new(RecipeStore::from_recipes(Vec::new()));
        let url = spawn(grocery_service::build_router(empty, resolver())).await;
        let grocery = HttpGroceryClient::new(client(), &url);

        let err = grocery.grocery_list(&[]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("503"), "unexpected error: {msg}");
        assert!(msg.contains("no recipes found"), "unexpected error: {msg}");
    }
}

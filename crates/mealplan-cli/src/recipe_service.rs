//! Recipe service: keyword retrieval and lookup by id.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use mealplan_core::recipe::{RecipeIndex, RecipeQuery, RecipesResponse};
use mealplan_core::types::Recipe;

use crate::serve_cmd::{AppError, health};

pub fn build_router(index: Arc<RecipeIndex>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/a2a/get_recipes", post(get_recipes))
        .route("/recipes/{id}", get(get_recipe))
        .layer(CorsLayer::permissive())
        .with_state(index)
}

async fn get_recipes(
    State(index): State<Arc<RecipeIndex>>,
    Json(query): Json<RecipeQuery>,
) -> Json<RecipesResponse> {
    let recipes = index.search(&query);
    tracing::debug!(query = %query.query, k = query.k, returned = recipes.len(), "get_recipes");
    Json(RecipesResponse { recipes })
}

async fn get_recipe(
    State(index): State<Arc<RecipeIndex>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    index
        .store()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("recipe {id} not found")))
}

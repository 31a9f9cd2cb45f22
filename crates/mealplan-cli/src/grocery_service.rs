//! Grocery service: aggregates a meal plan into a shopping list.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use mealplan_core::grocery::{GroceryRequest, GroceryResponse, aggregate};
use mealplan_core::ingredient::Resolver;
use mealplan_core::recipe::RecipeLookup;

use crate::serve_cmd::{AppError, health};

#[derive(Clone)]
pub struct GroceryState {
    lookup: Arc<dyn RecipeLookup>,
    resolver: Arc<Resolver>,
}

pub fn build_router(lookup: Arc<dyn RecipeLookup>, resolver: Arc<Resolver>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/a2a/generate_grocery_list", post(generate_grocery_list))
        .layer(CorsLayer::permissive())
        .with_state(GroceryState { lookup, resolver })
}

async fn generate_grocery_list(
    State(state): State<GroceryState>,
    Json(request): Json<GroceryRequest>,
) -> Result<Json<GroceryResponse>, AppError> {
    let grocery_list = aggregate(&request.plan, state.lookup.as_ref(), &state.resolver)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "grocery aggregation failed");
            AppError::unavailable(err.to_string())
        })?;
    tracing::info!(
        days = request.plan.len(),
        items = grocery_list.len(),
        "generated grocery list"
    );
    Ok(Json(GroceryResponse { grocery_list }))
}

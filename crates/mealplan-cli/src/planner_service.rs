//! Planner service: builds a plan from a profile, then asks for the grocery
//! list.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use mealplan_core::grocery::aggregate;
use mealplan_core::ingredient::Resolver;
use mealplan_core::planner::{Profile, RecipeRetriever, build_plan};
use mealplan_core::recipe::RecipeLookup;
use mealplan_core::types::{AggregationEntry, PlanEntry};

use crate::serve_cmd::health;

/// Where the planner sends a finished plan for aggregation.
#[async_trait]
pub trait GroceryBackend: Send + Sync {
    async fn grocery_list(&self, plan: &[PlanEntry]) -> anyhow::Result<Vec<AggregationEntry>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn GroceryBackend) {}
};

/// In-process aggregation against a local recipe source.
pub struct LocalGrocery {
    lookup: Arc<dyn RecipeLookup>,
    resolver: Arc<Resolver>,
}

impl LocalGrocery {
    pub fn new(lookup: Arc<dyn RecipeLookup>, resolver: Arc<Resolver>) -> Self {
        Self { lookup, resolver }
    }
}

#[async_trait]
impl GroceryBackend for LocalGrocery {
    async fn grocery_list(&self, plan: &[PlanEntry]) -> anyhow::Result<Vec<AggregationEntry>> {
        Ok(aggregate(plan, self.lookup.as_ref(), &self.resolver).await?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub trace_id: Uuid,
    pub plan: Vec<PlanEntry>,
    pub grocery: Vec<AggregationEntry>,
    pub generated_at: DateTime<Utc>,
}

/// Build a plan and its grocery list.
///
/// A grocery failure does not fail the call: the plan comes back with an
/// empty grocery list.
pub async fn plan_meals(
    profile: &Profile,
    retriever: &dyn RecipeRetriever,
    grocery: &dyn GroceryBackend,
    rng: &mut StdRng,
) -> PlanResponse {
    let trace_id = Uuid::new_v4();
    tracing::info!(
        %trace_id,
        days = profile.days,
        diet = %profile.diet,
        region = %profile.region,
        "planning meals"
    );

    let plan = build_plan(profile, retriever, rng).await;
    let grocery = match grocery.grocery_list(&plan).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(
                %trace_id,
                error = %format!("{err:#}"),
                "grocery list unavailable; returning plan without it"
            );
            Vec::new()
        }
    };

    PlanResponse {
        trace_id,
        plan,
        grocery,
        generated_at: Utc::now(),
    }
}

#[derive(Clone)]
pub struct PlannerState {
    retriever: Arc<dyn RecipeRetriever>,
    grocery: Arc<dyn GroceryBackend>,
}

impl PlannerState {
    pub fn new(retriever: Arc<dyn RecipeRetriever>, grocery: Arc<dyn GroceryBackend>) -> Self {
        Self { retriever, grocery }
    }
}

pub fn build_router(state: PlannerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/a2a/plan_meals", post(plan_meals_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn plan_meals_handler(
    State(state): State<PlannerState>,
    Json(profile): Json<Profile>,
) -> Json<PlanResponse> {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let response = plan_meals(
        &profile,
        state.retriever.as_ref(),
        state.grocery.as_ref(),
        &mut rng,
    )
    .await;
    Json(response)
}

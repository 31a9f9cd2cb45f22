//! Shared plumbing for the HTTP services: error responses, the health
//! route, and the listener loop. The routers live in the `*_service`
//! modules.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::{Value, json};

use mealplan_core::recipe::{RecipeIndex, RecipeLookup};

use crate::ServeCommands;
use crate::clients::{HttpGroceryClient, HttpRecipeLookup, HttpRecipeRetriever};
use crate::config::MealplanConfig;
use crate::planner_service::{GroceryBackend, LocalGrocery, PlannerState};
use crate::{grocery_service, planner_service, recipe_service};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared handlers
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Build the requested service from config and serve it until Ctrl+C.
///
/// Everything the service needs (ingredient table, recipe store, HTTP
/// clients) is loaded before the listener binds.
pub async fn run_serve_command(command: ServeCommands, config: &MealplanConfig) -> Result<()> {
    match command {
        ServeCommands::Recipes { bind, port } => {
            let store = config.load_store()?;
            if store.is_empty() {
                tracing::warn!(
                    dir = %config.recipes_dir.display(),
                    "no recipes loaded; retrieval will return nothing"
                );
            }
            let index = Arc::new(RecipeIndex::build(Arc::new(store)));
            run_serve("recipes", recipe_service::build_router(index), &bind, port).await
        }
        ServeCommands::Grocery {
            bind,
            port,
            remote_recipes,
        } => {
            let resolver = Arc::new(config.load_resolver()?);
            let lookup: Arc<dyn RecipeLookup> = if remote_recipes {
                Arc::new(HttpRecipeLookup::new(
                    config.http_client()?,
                    &config.recipe_url,
                ))
            } else {
                Arc::new(config.load_store()?)
            };
            let app = grocery_service::build_router(lookup, resolver);
            run_serve("grocery", app, &bind, port).await
        }
        ServeCommands::Planner { bind, port, local } => {
            let state = if local {
                let store = Arc::new(config.load_store()?);
                let resolver = Arc::new(config.load_resolver()?);
                let grocery: Arc<dyn GroceryBackend> =
                    Arc::new(LocalGrocery::new(store.clone(), resolver));
                PlannerState::new(Arc::new(RecipeIndex::build(store)), grocery)
            } else {
                let client = config.http_client()?;
                PlannerState::new(
                    Arc::new(HttpRecipeRetriever::new(client.clone(), &config.recipe_url)),
                    Arc::new(HttpGroceryClient::new(client, &config.grocery_url)),
                )
            };
            run_serve("planner", planner_service::build_router(state), &bind, port).await
        }
    }
}

pub async fn run_serve(name: &str, app: Router, bind: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("{name} service listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("{name} service shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

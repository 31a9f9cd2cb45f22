//! Grocery aggregation and its wire types.

pub mod aggregator;

use serde::{Deserialize, Serialize};

use crate::types::{AggregationEntry, PlanEntry};

pub use aggregator::{GroceryError, MAX_CONCURRENT_LOOKUPS, aggregate, aggregate_with};

/// Request body of the grocery list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroceryRequest {
    #[serde(default)]
    pub plan: Vec<PlanEntry>,
}

/// Response body of the grocery list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroceryResponse {
    pub grocery_list: Vec<AggregationEntry>,
}

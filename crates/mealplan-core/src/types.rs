//! Wire types shared by the recipe, grocery, and planner services.
//!
//! Field names follow the JSON documents on disk and on the wire
//! (`qty`, `recipe_id`, `total_grams`, `raw_qty`).

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// One ingredient line as authored in a recipe document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIngredientLine {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub item: String,
    /// Free-text quantity, e.g. "1/2 cup" or "1 pinch". Empty when absent.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub qty: String,
}

impl RawIngredientLine {
    pub fn new(item: impl Into<String>, qty: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            qty: qty.into(),
        }
    }
}

/// A recipe document.
///
/// Only `id` and `ingredients` are used by grocery aggregation. The
/// descriptive fields feed retrieval, and anything else in the document is
/// kept in `extra` so it survives a round trip through the recipe service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RawIngredientLine>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_line_summary: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Recipe {
    /// A bare recipe with just an id and ingredient lines.
    pub fn new(id: impl Into<String>, ingredients: Vec<RawIngredientLine>) -> Self {
        Self {
            id: id.into(),
            title: None,
            region: None,
            diet: None,
            tags: Vec::new(),
            cook_time_min: None,
            servings: None,
            spice_level: None,
            ingredients,
            steps: Vec::new(),
            one_line_summary: None,
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// One meal slot in a day of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMeal {
    #[serde(default)]
    pub meal_name: String,
    /// `None` when no recipe could be chosen for the slot.
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PlannedMeal {
    pub fn new(meal_name: impl Into<String>, recipe_id: Option<&str>) -> Self {
        Self {
            meal_name: meal_name.into(),
            recipe_id: recipe_id.map(str::to_owned),
            title: None,
            cook_time_min: None,
            note: None,
        }
    }

    /// A slot left empty, with the reason recorded in `note`.
    pub fn placeholder(meal_name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::new(meal_name, None)
        }
    }

    /// The recipe id, treating an empty string the same as a missing one.
    pub fn recipe_id(&self) -> Option<&str> {
        self.recipe_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One day of the plan, meals in serving order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub day: u32,
    #[serde(default)]
    pub meals: Vec<PlannedMeal>,
}

// ---------------------------------------------------------------------------
// Grocery list
// ---------------------------------------------------------------------------

/// Where one occurrence of an ingredient came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub recipe_id: String,
    pub raw_qty: String,
}

/// One line of the consolidated grocery list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationEntry {
    /// Canonical ingredient name.
    pub item: String,
    /// Sum of every converted occurrence, rounded to 2 decimals. `None` when
    /// no occurrence could be converted to mass.
    pub total_grams: Option<f64>,
    /// Occurrences that could not be converted and are counted as units.
    pub count: u32,
    pub instances: Vec<Instance>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

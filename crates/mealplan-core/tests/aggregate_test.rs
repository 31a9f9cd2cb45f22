//! Integration tests for grocery aggregation through the public API.
//!
//! Each test builds its own ingredient table from CSV text and its own
//! in-memory recipe source, so no test depends on files under `data/`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use mealplan_core::grocery::{GroceryError, aggregate, aggregate_with};
use mealplan_core::ingredient::{AliasPolicy, IngredientTable, Resolver, ZeroFactorPolicy};
use mealplan_core::recipe::{LookupError, RecipeLookup, RecipeStore};
use mealplan_core::types::{PlanEntry, PlannedMeal, RawIngredientLine, Recipe};

const MAPPINGS: &str = "\
canonical_name,aliases,grams_per_cup,grams_per_tbsp,grams_per_tsp
rice,raw rice,180,11.25,3.75
moong dal,mung dal;MUNG DAL,200,12.5,4.2
salt,,0,18,6
";

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn resolver() -> Resolver {
    let table = IngredientTable::from_reader(MAPPINGS.as_bytes(), AliasPolicy::FirstMatch)
        .expect("test table should parse");
    Resolver::new(Arc::new(table))
}

fn recipe(id: &str, lines: &[(&str, &str)]) -> Recipe {
    Recipe::new(
        id,
        lines
            .iter()
            .map(|(item, qty)| RawIngredientLine::new(*item, *qty))
            .collect(),
    )
}

fn recipes(list: Vec<Recipe>) -> HashMap<String, Recipe> {
    list.into_iter().map(|r| (r.id.clone(), r)).collect()
}

fn day(n: u32, meals: &[(&str, Option<&str>)]) -> PlanEntry {
    PlanEntry {
        day: n,
        meals: meals
            .iter()
            .map(|(name, id)| PlannedMeal::new(*name, *id))
            .collect(),
    }
}

fn sample_recipes() -> HashMap<String, Recipe> {
    recipes(vec![
        recipe("r001", &[("Rice", "1 cup"), ("Moong Dal", "1/2 cup")]),
        recipe("r002", &[("Rice", "2 cups")]),
    ])
}

/// Answers after a per-id delay, so later ids can finish first.
struct Delayed {
    recipes: HashMap<String, Recipe>,
    delays_ms: HashMap<String, u64>,
}

#[async_trait]
impl RecipeLookup for Delayed {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        let delay = self.delays_ms.get(id).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(self.recipes.get(id).cloned())
    }
}

/// Fails for one id and answers normally for the rest.
struct FailsOn {
    bad_id: &'static str,
    recipes: HashMap<String, Recipe>,
}

#[async_trait]
impl RecipeLookup for FailsOn {
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, LookupError> {
        if id == self.bad_id {
            return Err(LookupError::Unavailable("connection reset".into()));
        }
        Ok(self.recipes.get(id).cloned())
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn two_recipe_plan_sums_grams() {
    let plan = vec![day(1, &[("lunch", Some("r001")), ("dinner", Some("r002"))])];
    let list = aggregate(&plan, &sample_recipes(), &resolver()).await.unwrap();

    assert_eq!(list.len(), 2);

    let dal = &list[0];
    assert_eq!(dal.item, "moong dal");
    assert_eq!(dal.total_grams, Some(100.0));
    assert_eq!(dal.count, 0);
    assert_eq!(dal.instances.len(), 1);
    assert_eq!(dal.instances[0].recipe_id, "r001");
    assert_eq!(dal.instances[0].raw_qty, "1/2 cup");

    let rice = &list[1];
    assert_eq!(rice.item, "rice");
    assert_eq!(rice.total_grams, Some(540.0));
    assert_eq!(rice.count, 0);
    let sources: Vec<(&str, &str)> = rice
        .instances
        .iter()
        .map(|i| (i.recipe_id.as_str(), i.raw_qty.as_str()))
        .collect();
    assert_eq!(sources, [("r001", "1 cup"), ("r002", "2 cups")]);
}

#[tokio::test]
async fn output_is_sorted_by_item() {
    let catalog = recipes(vec![recipe(
        "r010",
        &[
            ("turmeric", "1 tsp"),
            ("Salt", "1 tsp"),
            ("basmati", "1 cup"),
            ("Rice", "1 cup"),
            ("ajwain", "1 pinch"),
        ],
    )]);
    let plan = vec![day(1, &[("dinner", Some("r010"))])];
    let list = aggregate(&plan, &catalog, &resolver()).await.unwrap();

    let items: Vec<&str> = list.iter().map(|e| e.item.as_str()).collect();
    assert_eq!(items, ["ajwain", "basmati", "rice", "salt", "turmeric"]);
}

#[tokio::test]
async fn null_and_unknown_ids_contribute_nothing() {
    let plan = vec![day(
        1,
        &[
            ("breakfast", None),
            ("lunch", Some("r999")),
            ("dinner", Some("r002")),
        ],
    )];
    let list = aggregate(&plan, &sample_recipes(), &resolver()).await.unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].item, "rice");
    assert_eq!(list[0].total_grams, Some(360.0));
}

#[tokio::test]
async fn empty_plan_yields_empty_list() {
    let list = aggregate(&[], &sample_recipes(), &resolver()).await.unwrap();
    assert!(list.is_empty());

    let list = aggregate(&[day(1, &[])], &sample_recipes(), &resolver())
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn failing_lookup_aborts_without_partial_list() {
    let source = FailsOn {
        bad_id: "r002",
        recipes: sample_recipes(),
    };
    let plan = vec![day(1, &[("lunch", Some("r001")), ("dinner", Some("r002"))])];

    let err = aggregate(&plan, &source, &resolver()).await.unwrap_err();
    match err {
        GroceryError::UpstreamUnavailable { recipe_id, source } => {
            assert_eq!(recipe_id, "r002");
            assert!(matches!(source, LookupError::Unavailable(_)));
        }
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_store_is_unavailable_even_for_empty_plan() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecipeStore::load(dir.path()).unwrap();

    let err = aggregate(&[], &store, &resolver()).await.unwrap_err();
    assert!(
        matches!(err, GroceryError::SourceUnavailable(LookupError::Unavailable(_))),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("no recipes found"));
}

#[tokio::test]
async fn slow_lookups_keep_plan_order() {
    let source = Delayed {
        recipes: recipes(vec![
            recipe("r001", &[("Rice", "1 cup")]),
            recipe("r002", &[("Rice", "2 cups")]),
            recipe("r003", &[("raw rice", "1/2 cup")]),
        ]),
        delays_ms: HashMap::from([("r001".to_string(), 60), ("r002".to_string(), 30)]),
    };
    let plan = vec![
        day(1, &[("lunch", Some("r001")), ("dinner", Some("r002"))]),
        day(2, &[("lunch", Some("r003")), ("dinner", Some("r001"))]),
    ];

    let list = aggregate(&plan, &source, &resolver()).await.unwrap();
    assert_eq!(list.len(), 1);
    let ids: Vec<&str> = list[0]
        .instances
        .iter()
        .map(|i| i.recipe_id.as_str())
        .collect();
    assert_eq!(ids, ["r001", "r002", "r003", "r001"]);
    assert_eq!(list[0].total_grams, Some(810.0));
}

#[test]
fn aliases_merge_into_one_entry() {
    let catalog = recipes(vec![recipe(
        "r001",
        &[("mung dal", "1 cup"), ("MUNG DAL", "1 tbsp"), ("  Moong Dal ", "1 pinch")],
    )]);
    let plan = vec![day(1, &[("lunch", Some("r001"))])];
    let list = aggregate_with(&plan, &catalog, &resolver());

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].item, "moong dal");
    assert_eq!(list[0].total_grams, Some(212.5));
    assert_eq!(list[0].count, 1);
    assert_eq!(list[0].instances.len(), 3);
}

#[test]
fn grams_without_volume_unit_fall_back_to_count() {
    let catalog = recipes(vec![recipe("r001", &[("rice", "200g"), ("rice", "")])]);
    let plan = vec![day(1, &[("lunch", Some("r001"))])];
    let list = aggregate_with(&plan, &catalog, &resolver());

    assert_eq!(list[0].item, "rice");
    assert_eq!(list[0].total_grams, None);
    assert_eq!(list[0].count, 2);
    assert_eq!(list[0].instances[0].raw_qty, "200g");
    assert_eq!(list[0].instances[1].raw_qty, "");
}

#[test]
fn zero_factor_literal_converts_to_zero_grams() {
    let catalog = recipes(vec![recipe("r001", &[("salt", "1 cup")])]);
    let plan = vec![day(1, &[("lunch", Some("r001"))])];
    let list = aggregate_with(&plan, &catalog, &resolver());

    assert_eq!(list[0].total_grams, Some(0.0));
    assert_eq!(list[0].count, 0);
}

#[test]
fn zero_factor_unknown_counts_instead() {
    let resolver = resolver().with_zero_factor_policy(ZeroFactorPolicy::Unknown);
    let catalog = recipes(vec![recipe("r001", &[("salt", "1 cup"), ("salt", "1 tsp")])]);
    let plan = vec![day(1, &[("lunch", Some("r001"))])];
    let list = aggregate_with(&plan, &catalog, &resolver);

    assert_eq!(list[0].total_grams, Some(6.0));
    assert_eq!(list[0].count, 1);
    assert_eq!(list[0].instances.len(), 2);
}

#[test]
fn instances_match_occurrences_across_the_plan() {
    let catalog = recipes(vec![
        recipe("r001", &[("Rice", "1 cup"), ("rice", "a handful")]),
        recipe("r002", &[("raw rice", "1 tbsp")]),
    ]);
    let plan = vec![
        day(1, &[("lunch", Some("r001")), ("dinner", Some("r002"))]),
        day(2, &[("lunch", Some("r001"))]),
    ];
    let list = aggregate_with(&plan, &catalog, &resolver());

    let rice = &list[0];
    assert_eq!(rice.instances.len(), 5);
    assert_eq!(rice.count, 2);
    assert_eq!(rice.total_grams, Some(371.25));
}

#[test]
fn overflowing_quantity_is_counted_not_converted() {
    let huge = format!("{} cup", "9".repeat(400));
    let catalog = recipes(vec![recipe("r001", &[("Rice", huge.as_str())])]);
    let plan = vec![day(1, &[("lunch", Some("r001"))])];

    let list = aggregate_with(&plan, &catalog, &resolver());
    assert_eq!(list[0].item, "rice");
    assert_eq!(list[0].total_grams, None);
    assert_eq!(list[0].count, 1);

    let json = serde_json::to_value(&list[0]).unwrap();
    assert!(json["total_grams"].is_null());
    assert_eq!(json["count"], 1);
}

//! `mealplan generate-recipes`: synthetic recipe documents for seeding the
//! recipe directory.
//!
//! Walks regions, then each region's dishes, then every diet, and emits one
//! recipe per combination until the limit is reached. Each recipe gets the
//! shared base ingredients plus two ingredients drawn from its diet.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use mealplan_core::types::{RawIngredientLine, Recipe};

const REGIONS: &[(&str, &[&str])] = &[
    (
        "North",
        &[
            "Paneer Butter Masala",
            "Rajma Chawal",
            "Aloo Paratha",
            "Dal Makhani",
            "Chole Bhature",
            "Kadhi Pakora",
            "Baingan Bharta",
        ],
    ),
    (
        "South",
        &[
            "Masala Dosa",
            "Idli Sambar",
            "Pesarattu",
            "Curd Rice",
            "Upma",
            "Lemon Rice",
            "Vegetable Kurma",
        ],
    ),
    (
        "East",
        &[
            "Fish Curry",
            "Aloo Posto",
            "Litti Chokha",
            "Macher Jhol",
            "Ghugni",
            "Chhena Poda",
        ],
    ),
    (
        "West",
        &[
            "Vada Pav",
            "Thepla",
            "Undhiyu",
            "Misal Pav",
            "Dal Dhokli",
            "Goan Fish Curry",
        ],
    ),
];

const DIETS: &[(&str, &[&str])] = &[
    ("veg", &["paneer", "potato", "tomato", "onion", "rice", "dal"]),
    ("nonveg", &["chicken", "fish", "egg", "mutton"]),
    ("vegan", &["tofu", "vegetables", "lentils", "rice"]),
    ("eggetarian", &["egg", "onion", "tomato"]),
];

const BASE_INGREDIENTS: [(&str, &str); 3] =
    [("salt", "1 tsp"), ("oil", "1 tbsp"), ("onion", "1/2 cup")];

const DIET_QUANTITIES: [&str; 3] = ["1 cup", "1/2 cup", "1 tbsp"];
const COOK_TIMES: [u32; 5] = [15, 20, 25, 30, 40];
const SPICE_LEVELS: [&str; 3] = ["low", "medium", "high"];
const STEPS: [&str; 3] = ["Prep ingredients", "Cook on medium flame", "Serve hot"];
const PROVENANCE: &str = "synthesized";

pub const DEFAULT_LIMIT: usize = 50;
pub const DEFAULT_START_ID: u32 = 50;

/// Generate up to `limit` recipes with ids counting up from `start_id`.
pub fn generate_recipes<R: Rng + ?Sized>(
    start_id: u32,
    limit: usize,
    rng: &mut R,
    created_at: DateTime<Utc>,
) -> Vec<Recipe> {
    let combinations = REGIONS.iter().flat_map(|(region, titles)| {
        titles.iter().flat_map(move |title| {
            DIETS
                .iter()
                .map(move |(diet, staples)| (*region, *title, *diet, *staples))
        })
    });

    combinations
        .take(limit)
        .zip(start_id..)
        .map(|((region, title, diet, staples), rid)| {
            create_recipe(rid, title, region, diet, staples, rng, created_at)
        })
        .collect()
}

fn create_recipe<R: Rng + ?Sized>(
    rid: u32,
    title: &str,
    region: &str,
    diet: &str,
    staples: &[&str],
    rng: &mut R,
    created_at: DateTime<Utc>,
) -> Recipe {
    let mut ingredients: Vec<RawIngredientLine> = BASE_INGREDIENTS
        .iter()
        .map(|(item, qty)| RawIngredientLine::new(*item, *qty))
        .collect();
    let picks: Vec<&str> = staples.choose_multiple(rng, 2).copied().collect();
    for item in picks {
        let qty = DIET_QUANTITIES.choose(rng).copied().unwrap_or("1 cup");
        ingredients.push(RawIngredientLine::new(item, qty));
    }

    let mut extra = Map::new();
    for key in ["source_url", "license", "curation_status"] {
        extra.insert(key.to_string(), Value::from(PROVENANCE));
    }
    extra.insert(
        "created_at".to_string(),
        Value::from(created_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    Recipe {
        id: format!("r{rid:03}"),
        title: Some(title.to_string()),
        region: Some(region.to_string()),
        diet: Some(diet.to_string()),
        tags: vec!["indian".to_string(), region.to_lowercase(), diet.to_string()],
        cook_time_min: COOK_TIMES.choose(rng).copied(),
        servings: Some(2),
        spice_level: SPICE_LEVELS.choose(rng).map(|s| s.to_string()),
        ingredients,
        steps: STEPS.iter().map(|s| s.to_string()).collect(),
        one_line_summary: Some(format!("{title}: classic {region} Indian dish.")),
        extra,
    }
}

/// Execute `mealplan generate-recipes`: write one `<id>.json` per recipe.
pub fn run_generate(out_dir: &Path, limit: usize, start_id: u32, seed: Option<u64>) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let recipes = generate_recipes(start_id, limit, &mut rng, Utc::now());

    for recipe in &recipes {
        let path = out_dir.join(format!("{}.json", recipe.id));
        let json = serde_json::to_string_pretty(recipe).context("failed to serialize recipe")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    tracing::info!(count = recipes.len(), dir = %out_dir.display(), "generated recipes");
    println!("Generated {} recipes into {}", recipes.len(), out_dir.display());
    Ok(())
}

mod clients;
mod config;
mod generate_cmd;
mod grocery_cmd;
mod grocery_service;
mod plan_cmd;
mod planner_service;
mod recipe_service;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mealplan_core::planner::Profile;

use config::{MealplanConfig, Overrides};

#[derive(Parser)]
#[command(name = "mealplan", about = "Meal planner with recipe retrieval and grocery aggregation")]
struct Cli {
    /// Recipe JSON directory (overrides MEALPLAN_RECIPES_DIR env var)
    #[arg(long, global = true)]
    recipes_dir: Option<PathBuf>,

    /// Ingredient mapping CSV (overrides MEALPLAN_INGREDIENT_MAPPINGS env var)
    #[arg(long, global = true)]
    mappings: Option<PathBuf>,

    /// Recipe service base URL (overrides MEALPLAN_RECIPE_URL env var)
    #[arg(long, global = true)]
    recipe_url: Option<String>,

    /// Grocery service base URL (overrides MEALPLAN_GROCERY_URL env var)
    #[arg(long, global = true)]
    grocery_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            recipes_dir: self.recipes_dir.clone(),
            ingredient_mappings: self.mappings.clone(),
            recipe_url: self.recipe_url.clone(),
            grocery_url: self.grocery_url.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file with default settings
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run one of the HTTP services
    Serve {
        #[command(subcommand)]
        service: ServeCommands,
    },
    /// Aggregate a plan file into a grocery list (offline)
    Grocery {
        /// Path to a plan JSON file
        plan: PathBuf,
    },
    /// Build a meal plan and grocery list (offline)
    Plan {
        /// Number of days to plan
        #[arg(long, default_value_t = 3)]
        days: u32,
        /// Diet filter (e.g. veg, nonveg, vegan)
        #[arg(long, default_value = "veg")]
        diet: String,
        /// Region filter, or "All" for any region
        #[arg(long, default_value = "All")]
        region: String,
        /// Servings per meal
        #[arg(long, default_value_t = 2)]
        servings: u32,
        /// Ingredient to avoid (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,
        /// Seed for reproducible recipe choice
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write synthetic recipe documents
    GenerateRecipes {
        /// Output directory (defaults to the configured recipes dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Maximum number of recipes to write
        #[arg(long, default_value_t = generate_cmd::DEFAULT_LIMIT)]
        limit: usize,
        /// Numeric id of the first recipe
        #[arg(long, default_value_t = generate_cmd::DEFAULT_START_ID)]
        start_id: u32,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum ServeCommands {
    /// Recipe retrieval service
    Recipes {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8001)]
        port: u16,
    },
    /// Grocery aggregation service
    Grocery {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8002)]
        port: u16,
        /// Fetch recipes from the recipe service instead of the local directory
        #[arg(long)]
        remote_recipes: bool,
    },
    /// Planner service
    Planner {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Retrieve and aggregate in-process instead of calling the other services
        #[arg(long)]
        local: bool,
    },
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  data.recipes_dir = {}", cfg.data.recipes_dir.display());
    println!(
        "  data.ingredient_mappings = {}",
        cfg.data.ingredient_mappings.display()
    );
    println!("  services.recipe_url = {}", cfg.services.recipe_url);
    println!("  services.grocery_url = {}", cfg.services.grocery_url);
    println!();
    println!("Next: run `mealplan generate-recipes` to seed the recipe directory.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli.overrides();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Serve { service } => {
            let resolved = MealplanConfig::resolve(&overrides)?;
            serve_cmd::run_serve_command(service, &resolved).await?;
        }
        Commands::Grocery { plan } => {
            let resolved = MealplanConfig::resolve(&overrides)?;
            grocery_cmd::run_grocery(&resolved, &plan).await?;
        }
        Commands::Plan {
            days,
            diet,
            region,
            servings,
            allergies,
            seed,
        } => {
            let resolved = MealplanConfig::resolve(&overrides)?;
            let profile = Profile {
                diet,
                region,
                allergies,
                days,
                servings,
                ..Profile::default()
            };
            plan_cmd::run_plan(&resolved, &profile, seed).await?;
        }
        Commands::GenerateRecipes {
            out,
            limit,
            start_id,
            seed,
        } => {
            let out = match out {
                Some(dir) => dir,
                None => MealplanConfig::resolve(&overrides)?.recipes_dir,
            };
            generate_cmd::run_generate(&out, limit, start_id, seed)?;
        }
    }

    Ok(())
}

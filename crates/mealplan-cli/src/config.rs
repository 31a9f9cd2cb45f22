//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mealplan_core::ingredient::{AliasPolicy, IngredientTable, Resolver, ZeroFactorPolicy};
use mealplan_core::recipe::RecipeStore;

pub const DEFAULT_RECIPES_DIR: &str = "data/recipes";
pub const DEFAULT_INGREDIENT_MAPPINGS: &str = "data/ingredient_mappings.csv";
pub const DEFAULT_RECIPE_URL: &str = "http://localhost:8001";
pub const DEFAULT_GROCERY_URL: &str = "http://localhost:8002";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub services: ServicesSection,
    #[serde(default)]
    pub conversion: ConversionSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory of recipe JSON documents.
    pub recipes_dir: PathBuf,
    /// CSV table of canonical ingredients and unit factors.
    pub ingredient_mappings: PathBuf,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            recipes_dir: PathBuf::from(DEFAULT_RECIPES_DIR),
            ingredient_mappings: PathBuf::from(DEFAULT_INGREDIENT_MAPPINGS),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesSection {
    pub recipe_url: String,
    pub grocery_url: String,
    pub timeout_secs: u64,
}

impl Default for ServicesSection {
    fn default() -> Self {
        Self {
            recipe_url: DEFAULT_RECIPE_URL.to_string(),
            grocery_url: DEFAULT_GROCERY_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSection {
    pub zero_factor: ZeroFactorPolicy,
    /// Reject ingredient tables where two entries share an alias.
    pub strict_aliases: bool,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or
/// `~/.config/mealplan`, including on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

/// Return the path to the mealplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line; `None` falls through to the env var.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub recipes_dir: Option<PathBuf>,
    pub ingredient_mappings: Option<PathBuf>,
    pub recipe_url: Option<String>,
    pub grocery_url: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct MealplanConfig {
    pub recipes_dir: PathBuf,
    pub ingredient_mappings: PathBuf,
    pub recipe_url: String,
    pub grocery_url: String,
    pub timeout: Duration,
    pub zero_factor: ZeroFactorPolicy,
    pub alias_policy: AliasPolicy,
}

impl MealplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Recipes dir: `--recipes-dir` > `MEALPLAN_RECIPES_DIR` > `data.recipes_dir` > `data/recipes`
    /// - Mappings: `--mappings` > `MEALPLAN_INGREDIENT_MAPPINGS` > `data.ingredient_mappings` > `data/ingredient_mappings.csv`
    /// - Service URLs: `--recipe-url` / `--grocery-url` > `MEALPLAN_RECIPE_URL` / `MEALPLAN_GROCERY_URL` > `services.*`
    /// - Timeout: `MEALPLAN_TIMEOUT_SECS` > `services.timeout_secs` > 15
    ///
    /// A config file that exists but does not parse is an error.
    pub fn resolve(cli: &Overrides) -> Result<Self> {
        let file = if config_path().exists() {
            load_config()?
        } else {
            ConfigFile::default()
        };
        Self::resolve_with(cli, file)
    }

    fn resolve_with(cli: &Overrides, file: ConfigFile) -> Result<Self> {
        let recipes_dir = cli
            .recipes_dir
            .clone()
            .or_else(|| env_var("MEALPLAN_RECIPES_DIR").map(PathBuf::from))
            .unwrap_or(file.data.recipes_dir);

        let ingredient_mappings = cli
            .ingredient_mappings
            .clone()
            .or_else(|| env_var("MEALPLAN_INGREDIENT_MAPPINGS").map(PathBuf::from))
            .unwrap_or(file.data.ingredient_mappings);

        let recipe_url = cli
            .recipe_url
            .clone()
            .or_else(|| env_var("MEALPLAN_RECIPE_URL"))
            .unwrap_or(file.services.recipe_url);

        let grocery_url = cli
            .grocery_url
            .clone()
            .or_else(|| env_var("MEALPLAN_GROCERY_URL"))
            .unwrap_or(file.services.grocery_url);

        let timeout_secs = match env_var("MEALPLAN_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("MEALPLAN_TIMEOUT_SECS is not a number: {raw:?}"))?,
            None => file.services.timeout_secs,
        };

        let alias_policy = if file.conversion.strict_aliases {
            AliasPolicy::Strict
        } else {
            AliasPolicy::FirstMatch
        };

        Ok(Self {
            recipes_dir,
            ingredient_mappings,
            recipe_url: trim_url(recipe_url),
            grocery_url: trim_url(grocery_url),
            timeout: Duration::from_secs(timeout_secs),
            zero_factor: file.conversion.zero_factor,
            alias_policy,
        })
    }

    /// Load the ingredient table and build the resolver.
    ///
    /// A missing table file is tolerated (no gram conversion); a malformed
    /// one is fatal.
    pub fn load_resolver(&self) -> Result<Resolver> {
        let table = IngredientTable::load(&self.ingredient_mappings, self.alias_policy)
            .with_context(|| {
                format!(
                    "failed to load ingredient table {}",
                    self.ingredient_mappings.display()
                )
            })?;
        Ok(Resolver::new(Arc::new(table)).with_zero_factor_policy(self.zero_factor))
    }

    /// Load every recipe document from the recipes directory.
    pub fn load_store(&self) -> Result<RecipeStore> {
        RecipeStore::load(&self.recipes_dir).with_context(|| {
            format!("failed to load recipes from {}", self.recipes_dir.display())
        })
    }

    /// HTTP client shared by the service clients.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build HTTP client")
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

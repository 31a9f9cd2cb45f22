//! Canonical ingredient table.
//!
//! Loaded once from a CSV file with the columns `canonical_name`, `aliases`
//! (semicolon-separated), `grams_per_cup`, `grams_per_tbsp`, and
//! `grams_per_tsp`. Names and aliases are stored trimmed and lowercased.
//! The table is immutable after construction; share it behind an `Arc`.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quantity::VolumeUnit;

const COL_CANONICAL: &str = "canonical_name";
const COL_ALIASES: &str = "aliases";
const COL_CUP: &str = "grams_per_cup";
const COL_TBSP: &str = "grams_per_tbsp";
const COL_TSP: &str = "grams_per_tsp";

/// Errors raised while loading the ingredient table.
///
/// All of these are fatal at startup: a table that is present but malformed
/// must not be silently replaced by an empty one.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read ingredient table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ingredient table: {0}")]
    Csv(#[from] csv::Error),

    #[error("ingredient table is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid number {value:?} in column {column:?}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: negative factor {value} in column {column:?}")]
    NegativeFactor {
        line: u64,
        column: &'static str,
        value: f64,
    },

    #[error("alias {alias:?} is claimed by both {first:?} and {second:?}")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },
}

/// How to treat an alias that more than one entry claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// The first entry in load order wins.
    #[default]
    FirstMatch,
    /// Reject the table with [`ConfigurationError::AliasCollision`].
    Strict,
}

/// One canonical ingredient and its volume-to-mass factors.
///
/// A factor of `0.0` means the conversion for that unit is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientMapping {
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub grams_per_cup: f64,
    pub grams_per_tbsp: f64,
    pub grams_per_tsp: f64,
}

impl IngredientMapping {
    /// A mapping with no aliases and all factors unknown.
    pub fn new(canonical_name: &str) -> Self {
        Self {
            canonical_name: normalize(canonical_name),
            aliases: Vec::new(),
            grams_per_cup: 0.0,
            grams_per_tbsp: 0.0,
            grams_per_tsp: 0.0,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|a| normalize(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    pub fn with_factors(mut self, per_cup: f64, per_tbsp: f64, per_tsp: f64) -> Self {
        self.grams_per_cup = per_cup;
        self.grams_per_tbsp = per_tbsp;
        self.grams_per_tsp = per_tsp;
        self
    }

    /// Grams per one `unit` of this ingredient.
    pub fn factor(&self, unit: VolumeUnit) -> f64 {
        match unit {
            VolumeUnit::Cup => self.grams_per_cup,
            VolumeUnit::Tablespoon => self.grams_per_tbsp,
            VolumeUnit::Teaspoon => self.grams_per_tsp,
        }
    }
}

/// The loaded ingredient table with name and alias indexes.
#[derive(Debug, Clone, Default)]
pub struct IngredientTable {
    entries: Vec<IngredientMapping>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl IngredientTable {
    /// A table with no entries: every name canonicalizes to itself and no
    /// quantity converts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a CSV file.
    ///
    /// A missing file is not an error and yields an empty table. A file that
    /// exists but cannot be read or parsed is a [`ConfigurationError`].
    pub fn load(path: &Path, policy: AliasPolicy) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "ingredient table not found; gram conversion disabled"
            );
            return Ok(Self::empty());
        }

        let file = std::fs::File::open(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file, policy)?;
        tracing::info!(
            path = %path.display(),
            ingredients = table.len(),
            "loaded ingredient table"
        );
        Ok(table)
    }

    /// Parse the table from CSV text with a header row.
    pub fn from_reader<R: Read>(reader: R, policy: AliasPolicy) -> Result<Self, ConfigurationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let canonical_idx = column(COL_CANONICAL).ok_or(ConfigurationError::MissingColumn(COL_CANONICAL))?;
        let aliases_idx = column(COL_ALIASES).ok_or(ConfigurationError::MissingColumn(COL_ALIASES))?;
        let cup_idx = column(COL_CUP);
        let tbsp_idx = column(COL_TBSP);
        let tsp_idx = column(COL_TSP);

        let mut mappings = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            let name = cell(Some(canonical_idx));
            if name.is_empty() {
                tracing::warn!(line, "skipping ingredient row with empty canonical_name");
                continue;
            }

            let mapping = IngredientMapping::new(name)
                .with_aliases(cell(Some(aliases_idx)).split(';'))
                .with_factors(
                    parse_factor(cell(cup_idx), line, COL_CUP)?,
                    parse_factor(cell(tbsp_idx), line, COL_TBSP)?,
                    parse_factor(cell(tsp_idx), line, COL_TSP)?,
                );
            mappings.push(mapping);
        }

        Self::from_mappings(mappings, policy)
    }

    /// Build a table from mappings in load order.
    ///
    /// A repeated canonical name replaces the earlier entry's data but keeps
    /// its position.
    pub fn from_mappings<I>(mappings: I, policy: AliasPolicy) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = IngredientMapping>,
    {
        let mut entries: Vec<IngredientMapping> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for mapping in mappings {
            match by_name.get(&mapping.canonical_name) {
                Some(&idx) => {
                    tracing::warn!(
                        ingredient = %mapping.canonical_name,
                        "duplicate ingredient row replaces earlier one"
                    );
                    entries[idx] = mapping;
                }
                None => {
                    by_name.insert(mapping.canonical_name.clone(), entries.len());
                    entries.push(mapping);
                }
            }
        }

        let mut by_alias: HashMap<String, usize> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for alias in &entry.aliases {
                if policy == AliasPolicy::Strict {
                    if let Some(&owner) = by_name.get(alias).filter(|&&owner| owner != idx) {
                        return Err(ConfigurationError::AliasCollision {
                            alias: alias.clone(),
                            first: entries[owner].canonical_name.clone(),
                            second: entry.canonical_name.clone(),
                        });
                    }
                    if let Some(&owner) = by_alias.get(alias).filter(|&&owner| owner != idx) {
                        return Err(ConfigurationError::AliasCollision {
                            alias: alias.clone(),
                            first: entries[owner].canonical_name.clone(),
                            second: entry.canonical_name.clone(),
                        });
                    }
                }
                by_alias.entry(alias.clone()).or_insert(idx);
            }
        }

        Ok(Self {
            entries,
            by_name,
            by_alias,
        })
    }

    /// Look up an entry by its canonical name (already normalized).
    pub fn get(&self, canonical_name: &str) -> Option<&IngredientMapping> {
        self.by_name.get(canonical_name).map(|&idx| &self.entries[idx])
    }

    /// The canonical name of the first entry, in load order, that lists
    /// `alias` among its aliases.
    pub fn canonical_for_alias(&self, alias: &str) -> Option<&str> {
        self.by_alias
            .get(alias)
            .map(|&idx| self.entries[idx].canonical_name.as_str())
    }

    /// Entries in load order.
    pub fn iter(&self) -> impl Iterator<Item = &IngredientMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim and lowercase a name or alias.
pub(crate) fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn parse_factor(cell: &str, line: u64, column: &'static str) -> Result<f64, ConfigurationError> {
    if cell.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = cell
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ConfigurationError::InvalidNumber {
            line,
            column,
            value: cell.to_owned(),
        })?;
    if value < 0.0 {
        return Err(ConfigurationError::NegativeFactor {
            line,
            column,
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
canonical_name,aliases,grams_per_cup,grams_per_tbsp,grams_per_tsp
Rice,raw rice; basmati rice,180,11.25,
moong dal,mung dal;MUNG DAL;green gram,200,,
salt,,,18,6
";

    fn load(csv: &str, policy: AliasPolicy) -> Result<IngredientTable, ConfigurationError> {
        IngredientTable::from_reader(csv.as_bytes(), policy)
    }

    #[test]
    fn loads_rows_in_order() {
        let table = load(SAMPLE, AliasPolicy::FirstMatch).unwrap();
        let names: Vec<&str> = table.iter().map(|m| m.canonical_name.as_str()).collect();
        assert_eq!(names, ["rice", "moong dal", "salt"]);
    }

    #[test]
    fn normalizes_names_and_aliases() {
        let table = load(SAMPLE, AliasPolicy::FirstMatch).unwrap();
        let rice = table.get("rice").expect("rice should be present");
        assert_eq!(rice.aliases, ["raw rice", "basmati rice"]);
        assert_eq!(table.canonical_for_alias("mung dal"), Some("moong dal"));
        assert!(table.get("Rice").is_none(), "lookups take normalized keys");
    }

    #[test]
    fn empty_numeric_cells_default_to_zero() {
        let table = load(SAMPLE, AliasPolicy::FirstMatch).unwrap();
        let rice = table.get("rice").unwrap();
        assert_eq!(rice.factor(VolumeUnit::Cup), 180.0);
        assert_eq!(rice.factor(VolumeUnit::Tablespoon), 11.25);
        assert_eq!(rice.factor(VolumeUnit::Teaspoon), 0.0);
        let salt = table.get("salt").unwrap();
        assert!(salt.aliases.is_empty());
        assert_eq!(salt.grams_per_cup, 0.0);
    }

    #[test]
    fn numeric_columns_are_optional() {
        let table = load("canonical_name,aliases\nonion,onions\n", AliasPolicy::FirstMatch).unwrap();
        assert_eq!(table.get("onion").unwrap().grams_per_cup, 0.0);
    }

    #[test]
    fn missing_required_column_is_configuration_error() {
        let err = load("name,grams_per_cup\nrice,180\n", AliasPolicy::FirstMatch).unwrap_err();
        assert!(
            matches!(err, ConfigurationError::MissingColumn("canonical_name")),
            "unexpected error: {err}"
        );

        let err = load("canonical_name,grams_per_cup\nrice,180\n", AliasPolicy::FirstMatch)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingColumn("aliases")));
    }

    #[test]
    fn invalid_number_is_configuration_error() {
        let err = load(
            "canonical_name,aliases,grams_per_cup\nrice,,lots\n",
            AliasPolicy::FirstMatch,
        )
        .unwrap_err();
        match err {
            ConfigurationError::InvalidNumber { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "grams_per_cup");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_factor_is_configuration_error() {
        let err = load(
            "canonical_name,aliases,grams_per_tsp\nsalt,,-6\n",
            AliasPolicy::FirstMatch,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::NegativeFactor { .. }));
    }

    #[test]
    fn duplicate_canonical_row_keeps_position_and_takes_new_data() {
        let csv = "canonical_name,aliases,grams_per_cup\nrice,,100\nsalt,,\nrice,white rice,185\n";
        let table = load(csv, AliasPolicy::FirstMatch).unwrap();
        assert_eq!(table.len(), 2);
        let names: Vec<&str> = table.iter().map(|m| m.canonical_name.as_str()).collect();
        assert_eq!(names, ["rice", "salt"]);
        assert_eq!(table.get("rice").unwrap().grams_per_cup, 185.0);
        assert_eq!(table.canonical_for_alias("white rice"), Some("rice"));
    }

    #[test]
    fn shared_alias_resolves_to_first_entry() {
        let csv = "canonical_name,aliases\ntoor dal,dal\nmoong dal,dal\n";
        let table = load(csv, AliasPolicy::FirstMatch).unwrap();
        assert_eq!(table.canonical_for_alias("dal"), Some("toor dal"));
    }

    #[test]
    fn strict_policy_rejects_shared_alias() {
        let csv = "canonical_name,aliases\ntoor dal,dal\nmoong dal,dal\n";
        let err = load(csv, AliasPolicy::Strict).unwrap_err();
        match err {
            ConfigurationError::AliasCollision { alias, first, second } => {
                assert_eq!(alias, "dal");
                assert_eq!(first, "toor dal");
                assert_eq!(second, "moong dal");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_policy_rejects_alias_shadowed_by_canonical_name() {
        let csv = "canonical_name,aliases\nrice,\nbrown rice,rice\n";
        let err = load(csv, AliasPolicy::Strict).unwrap_err();
        assert!(matches!(err, ConfigurationError::AliasCollision { .. }));
    }

    #[test]
    fn strict_policy_accepts_clean_table() {
        let table = load(SAMPLE, AliasPolicy::Strict).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let tmp = tempfile::TempDir::new().unwrap();
        let table =
            IngredientTable::load(&tmp.path().join("absent.csv"), AliasPolicy::FirstMatch).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("ingredient_mappings.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let table = IngredientTable::load(&path, AliasPolicy::FirstMatch).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn skips_rows_with_empty_name() {
        let table = load("canonical_name,aliases\n,orphan\nrice,\n", AliasPolicy::FirstMatch).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.canonical_for_alias("orphan"), None);
    }
}

//! Ingredient name canonicalization and volume-to-mass conversion.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::quantity::parse_quantity;
use super::table::{IngredientTable, normalize};

/// Outcome of converting a quantity to grams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Converted(f64),
    /// No mass could be derived: empty or unparseable text, no volume unit,
    /// or an ingredient missing from the table.
    Unknown,
}

impl Conversion {
    pub fn grams(self) -> Option<f64> {
        match self {
            Self::Converted(g) => Some(g),
            Self::Unknown => None,
        }
    }
}

/// What a `0` factor in the table means when converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFactorPolicy {
    /// Multiply anyway; the occurrence converts to `0.0` grams.
    #[default]
    Literal,
    /// Treat the factor as missing; the occurrence is counted instead.
    Unknown,
}

impl fmt::Display for ZeroFactorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Literal => "literal",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for ZeroFactorPolicy {
    type Err = ZeroFactorPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "literal" => Ok(Self::Literal),
            "unknown" => Ok(Self::Unknown),
            other => Err(ZeroFactorPolicyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ZeroFactorPolicy`] string.
#[derive(Debug, Clone)]
pub struct ZeroFactorPolicyParseError(pub String);

impl fmt::Display for ZeroFactorPolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid zero factor policy: {:?} (expected literal or unknown)",
            self.0
        )
    }
}

impl std::error::Error for ZeroFactorPolicyParseError {}

/// Resolves ingredient names and quantities against a shared table.
///
/// Cheap to clone; the table itself is behind an `Arc` and never mutated,
/// so one resolver can serve concurrent aggregation requests.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<IngredientTable>,
    zero_factor: ZeroFactorPolicy,
}

impl Resolver {
    pub fn new(table: Arc<IngredientTable>) -> Self {
        Self {
            table,
            zero_factor: ZeroFactorPolicy::default(),
        }
    }

    pub fn with_zero_factor_policy(mut self, policy: ZeroFactorPolicy) -> Self {
        self.zero_factor = policy;
        self
    }

    pub fn table(&self) -> &IngredientTable {
        &self.table
    }

    pub fn zero_factor_policy(&self) -> ZeroFactorPolicy {
        self.zero_factor
    }

    /// Map a raw ingredient name to its canonical name.
    ///
    /// Empty input comes back unchanged. Otherwise the trimmed, lowercased
    /// name is matched against canonical names, then aliases in load order,
    /// and returned as-is when neither matches.
    pub fn canonicalize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let name = normalize(raw);
        if self.table.get(&name).is_some() {
            return name;
        }
        match self.table.canonical_for_alias(&name) {
            Some(canonical) => canonical.to_owned(),
            None => name,
        }
    }

    /// Convert a quantity of `raw_item` to grams.
    pub fn quantity_to_grams(&self, raw_item: &str, quantity_text: &str) -> Conversion {
        if quantity_text.is_empty() {
            return Conversion::Unknown;
        }
        let Some(quantity) = parse_quantity(quantity_text) else {
            return Conversion::Unknown;
        };
        let Some(unit) = quantity.unit else {
            return Conversion::Unknown;
        };
        let canonical = self.canonicalize(raw_item);
        let Some(mapping) = self.table.get(&canonical) else {
            return Conversion::Unknown;
        };

        let factor = mapping.factor(unit);
        if factor == 0.0 && self.zero_factor == ZeroFactorPolicy::Unknown {
            return Conversion::Unknown;
        }
        let grams = factor * quantity.value;
        if !grams.is_finite() {
            return Conversion::Unknown;
        }
        Conversion::Converted(grams)
    }
}

//! Quantity text parsing.
//!
//! Recognizes the first `<number> <unit>` pattern in free text, where the
//! number is an integer, a decimal, or a simple fraction (`1/2`) and the unit
//! is an optional cup/tablespoon/teaspoon token. Anything before or after
//! the match is ignored, so "about 2 tbsp, heaped" parses as 2 tbsp.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<num>[0-9./]+)\s*(?P<unit>cups|cup|tablespoons|tablespoon|tbsp|teaspoons|teaspoon|tsp)?",
    )
    .expect("quantity pattern should compile")
});

/// Volume units with a per-ingredient mass factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeUnit {
    Cup,
    Tablespoon,
    Teaspoon,
}

impl VolumeUnit {
    /// Map a unit token (any case, singular or plural) to its family.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "cup" | "cups" => Some(Self::Cup),
            "tbsp" | "tablespoon" | "tablespoons" => Some(Self::Tablespoon),
            "tsp" | "teaspoon" | "teaspoons" => Some(Self::Teaspoon),
            _ => None,
        }
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cup => "cup",
            Self::Tablespoon => "tbsp",
            Self::Teaspoon => "tsp",
        };
        f.write_str(s)
    }
}

/// A parsed amount with an optional volume unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    /// `None` for bare numbers and for units outside the cup/tbsp/tsp
    /// families ("200g", "2 pinches").
    pub unit: Option<VolumeUnit>,
}

/// Parse the first quantity pattern in `text`.
///
/// Returns `None` when there is no numeric token or the token does not
/// evaluate to a finite number (e.g. `1/0`, `1/2/3`, a lone `.`, or a
/// digit run too long for `f64`).
pub fn parse_quantity(text: &str) -> Option<Quantity> {
    let caps = QUANTITY_RE.captures(text)?;
    let value = parse_number(caps.name("num")?.as_str())?;
    let unit = caps
        .name("unit")
        .and_then(|m| VolumeUnit::from_token(m.as_str()));
    Some(Quantity { value, unit })
}

/// Evaluate an integer, decimal, or `a/b` fraction.
fn parse_number(token: &str) -> Option<f64> {
    let value = match token.split_once('/') {
        Some((numerator, denominator)) => {
            if denominator.contains('/') {
                return None;
            }
            let numerator: f64 = numerator.parse().ok()?;
            let denominator: f64 = denominator.parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            Some(numerator / denominator)
        }
        None => token.parse().ok(),
    };
    value.filter(|v: &f64| v.is_finite())
}

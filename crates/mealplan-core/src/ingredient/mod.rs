//! Ingredient resolution: the canonical table, quantity parsing, and the
//! resolver that turns raw ingredient lines into canonical names and grams.

pub mod quantity;
pub mod resolver;
pub mod table;

pub use quantity::{Quantity, VolumeUnit, parse_quantity};
pub use resolver::{Conversion, Resolver, ZeroFactorPolicy, ZeroFactorPolicyParseError};
pub use table::{AliasPolicy, ConfigurationError, IngredientMapping, IngredientTable};

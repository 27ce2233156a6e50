use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skumargin_core::ValueObject;

/// Policy constants consumed by the decision engine.
///
/// Passed by reference into every calculation; the engine never mutates it and
/// nothing in the workspace keeps a global copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginPolicy {
    /// Upper clamp. Also the answer when stock is exhausted.
    pub max_cap_percent: Decimal,
    /// Enables the lower clamp.
    pub min_level_flag: bool,
    pub min_level_percent: Decimal,
    /// Enables the fixed override.
    pub fixation_flag: bool,
    pub fixation_percent: Decimal,
}

impl ValueObject for MarginPolicy {}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            max_cap_percent: Decimal::new(25, 2),    // 0.25
            min_level_flag: true,
            min_level_percent: Decimal::new(-10, 2), // -0.10
            fixation_flag: false,
            fixation_percent: Decimal::new(15, 2),   // 0.15
        }
    }
}

//! Margin decision engine.
//!
//! Converts a SKU's order/stock signals and a base margin into the next target
//! margin. Rules are evaluated in strict priority order and the first match
//! wins:
//!
//! 1. **Stock exhausted**: `stock == 0` returns `max_cap_percent`.
//! 2. **Fixation**: `fixation_flag` returns `fixation_percent`.
//! 3. **Base adjustment**: move the base by `(actual - planned) / 100`; the cap
//!    applies on the upward branch only.
//! 4. **Min-level floor**: with `min_level_flag`, an adjusted value below
//!    `min_level_percent` is raised to it.
//! 5. **Default**: the adjusted value.
//!
//! The engine is total: every input yields a value and nothing is validated.

use rust_decimal::Decimal;
use serde::Serialize;

use skumargin_core::ValueObject;

use crate::policy::MarginPolicy;

/// Operational signals of one SKU, read for a single calculation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarginSignals {
    pub planned_orders_per_sku: i64,
    pub actual_orders: i64,
    pub stock: i64,
}

impl ValueObject for MarginSignals {}

/// Which rule produced the final margin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginRule {
    StockExhausted,
    Fixation,
    MinLevelFloor,
    Adjusted,
}

impl MarginRule {
    pub fn as_str(self) -> &'static str {
        match self {
            MarginRule::StockExhausted => "stock_exhausted",
            MarginRule::Fixation => "fixation",
            MarginRule::MinLevelFloor => "min_level_floor",
            MarginRule::Adjusted => "adjusted",
        }
    }
}

/// Engine output: the new margin plus the rule that decided it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarginDecision {
    pub margin: Decimal,
    pub rule: MarginRule,
}

/// Compute the new target margin.
pub fn calculate_target_margin(
    signals: &MarginSignals,
    base_margin_percent: Decimal,
    policy: &MarginPolicy,
) -> Decimal {
    decide(signals, base_margin_percent, policy).margin
}

/// Compute the new target margin and report which rule fired.
pub fn decide(
    signals: &MarginSignals,
    base_margin_percent: Decimal,
    policy: &MarginPolicy,
) -> MarginDecision {
    if signals.stock == 0 {
        tracing::debug!("stock is 0, returning max cap");
        return MarginDecision {
            margin: policy.max_cap_percent,
            rule: MarginRule::StockExhausted,
        };
    }

    if policy.fixation_flag {
        tracing::debug!("margin fixation is on, returning fixed percent");
        return MarginDecision {
            margin: policy.fixation_percent,
            rule: MarginRule::Fixation,
        };
    }

    let adjusted = adjusted_margin(signals, base_margin_percent, policy);
    tracing::debug!(%adjusted, "base adjustment computed");

    if policy.min_level_flag && adjusted < policy.min_level_percent {
        tracing::debug!(
            %adjusted,
            min_level = %policy.min_level_percent,
            "adjusted margin below min level, clamping"
        );
        return MarginDecision {
            margin: policy.min_level_percent,
            rule: MarginRule::MinLevelFloor,
        };
    }

    MarginDecision {
        margin: adjusted,
        rule: MarginRule::Adjusted,
    }
}

/// The base adjustment step on its own (before the min-level floor).
///
/// Only the upward branch is capped at `max_cap_percent`.
pub fn adjusted_margin(
    signals: &MarginSignals,
    base_margin_percent: Decimal,
    policy: &MarginPolicy,
) -> Decimal {
    let planned = signals.planned_orders_per_sku;
    let actual = signals.actual_orders;

    match actual.cmp(&planned) {
        core::cmp::Ordering::Less => base_margin_percent - order_gap(planned, actual),
        core::cmp::Ordering::Greater => {
            (base_margin_percent + order_gap(actual, planned)).min(policy.max_cap_percent)
        }
        core::cmp::Ordering::Equal => base_margin_percent,
    }
}

/// `(high - low) / 100` as an exact decimal.
///
/// The subtraction is widened so extreme order counts cannot overflow.
fn order_gap(high: i64, low: i64) -> Decimal {
    let diff = i128::from(high) - i128::from(low);
    Decimal::from_i128_with_scale(diff, 2)
}

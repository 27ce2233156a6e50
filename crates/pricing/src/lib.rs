//! Margin pricing domain module.
//!
//! This crate contains the margin decision engine and the ordering rules of the
//! margin history ledger, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod engine;
pub mod history;
pub mod policy;

pub use engine::{MarginDecision, MarginRule, MarginSignals, calculate_target_margin, decide};
pub use history::{MarginHistoryEntry, MarginMode, NewMarginEntry, parse_target_date};
pub use policy::MarginPolicy;

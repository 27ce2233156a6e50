//! Inventory domain module: SKU records and the signal snapshots read from them.
//!
//! Records are created by ingestion and are read-only to margin calculation.

pub mod sku;

pub use sku::{NewSkuRecord, SKU_CODE_MAX_LEN, SkuRecord, SkuSnapshot};

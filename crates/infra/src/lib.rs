//! Infrastructure layer: SKU storage, the margin ledger, the calculation
//! service and process configuration.

pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod margin_service;
pub mod pagination;
pub mod sku_store;


pub use config::{ConfigError, DatabaseSettings, Settings};
pub use error::StoreError;
pub use ledger::{InMemoryMarginLedger, MarginLedger, PostgresMarginLedger};
pub use margin_service::{MarginError, MarginOutcome, MarginRequest, MarginService};
pub use pagination::PageRequest;
pub use sku_store::{InMemorySkuStore, PostgresSkuStore, SkuStore};

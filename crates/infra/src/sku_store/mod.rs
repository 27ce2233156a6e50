//! SKU record storage: the snapshot provider consulted before each calculation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemorySkuStore;
pub use postgres::PostgresSkuStore;
pub use r#trait::SkuStore;

//! Append-only margin history ledger.
//!
//! One dated entry per margin decision; entries are never updated or deleted.
//! Ordering-sensitive reads (`latest`, `by_date`) use the explicit
//! `(target_date, sequence)` order rather than insertion order.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryMarginLedger;
pub use postgres::PostgresMarginLedger;
pub use r#trait::MarginLedger;

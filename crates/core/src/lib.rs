//! `skumargin-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the pricing and
//! inventory crates (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{MarginEntryId, SkuId};
pub use value_object::ValueObject;

//! Entity trait: identity that survives across recalculations.

/// Entity marker + minimal interface.
///
/// SKU records and margin history entries are entities: two entries with the
/// same margin value on the same date are still distinct records.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. The margin policy bundle and SKU signal snapshots are
//! value objects: they are handed to the decision engine by value and compared
//! field by field.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new instance with the changed fields (struct update syntax works
/// well for policy overrides in tests).
///
/// ```ignore
/// let strict = MarginPolicy { fixation_flag: true, ..MarginPolicy::default() };
/// assert_ne!(strict, MarginPolicy::default());
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

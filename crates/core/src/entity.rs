//! Entity trait: identity shared by stored records.

/// Minimal interface every persisted record exposes.
///
/// Users and products both carry a server-generated id, so stores can key
/// them uniformly.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

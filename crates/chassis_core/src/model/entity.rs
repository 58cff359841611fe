//! Entity identity contract.
//!
//! # Responsibility
//! - Give every persisted record one stable integer identity.
//!
//! # Invariants
//! - The identifier is absent until the storage layer assigns it.
//! - An assigned identifier is never reused for another record.

/// Storage-assigned identifier shared by every persisted record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = i64;

/// Minimal identity interface implemented by every persisted record type.
pub trait Entity {
    /// Returns the storage-assigned identifier, or `None` before the first
    /// insert has been staged.
    fn id(&self) -> Option<EntityId>;

    /// Records the identifier handed out by the storage layer.
    fn assign_id(&mut self, id: EntityId);
}

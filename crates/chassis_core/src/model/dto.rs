//! Data-transfer projection contract.

use crate::model::entity::EntityId;

/// External-facing projection of an entity.
///
/// A DTO has no identity of its own; it mirrors the identifier of the
/// entity it was mapped from, and leaves it absent for records that have
/// not been persisted yet.
pub trait Dto {
    /// Returns the mirrored entity identifier, if any.
    fn id(&self) -> Option<EntityId>;
}

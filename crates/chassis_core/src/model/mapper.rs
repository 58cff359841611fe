//! Bidirectional entity/DTO translation contract.

use crate::model::dto::Dto;
use crate::model::entity::Entity;

/// Translates between one DTO shape and one entity shape.
///
/// Mapping is expected to be lossless for every persisted column; fields a
/// DTO does not carry are initialized to their entity defaults on the way
/// in.
pub trait Mapper<D: Dto, E: Entity> {
    /// Builds the persistable entity for a DTO.
    fn to_entity(&self, dto: &D) -> E;

    /// Projects an entity into its external DTO shape.
    fn to_dto(&self, entity: &E) -> D;
}

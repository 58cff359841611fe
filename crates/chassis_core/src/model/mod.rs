//! Identity, projection and mapping contracts shared by all persisted kinds.
//!
//! # Responsibility
//! - Define the entity identity contract every stored record satisfies.
//! - Define the DTO projection and entity/DTO mapper contracts.
//!
//! # Invariants
//! - Every entity identifier is assigned by the storage layer, never by
//!   application code.
//! - A DTO carries no identity of its own beyond mirroring its entity's.

pub mod dto;
pub mod entity;
pub mod mapper;

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the per-entity-type data access contract.
//! - Isolate SQL text and row decoding from unit-of-work orchestration.
//!
//! # Invariants
//! - Repository mutations only stage changes; nothing is durable until the
//!   owning unit of work saves.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod generic_repo;

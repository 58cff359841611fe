//! Application-service layer.
//!
//! # Responsibility
//! - Orchestrate unit-of-work and mapper calls into a CRUD surface.
//! - Keep calling layers decoupled from storage details.

pub mod crud_service;

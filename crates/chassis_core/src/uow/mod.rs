//! Unit-of-work orchestration over the owned data context.
//!
//! # Responsibility
//! - Bound the data context's lifetime to one logical operation scope.
//! - Hand out exactly one repository per entity type.
//!
//! # Invariants
//! - The context is released exactly once, on every exit path.
//! - A disposed unit of work fails fast instead of touching a released
//!   connection.

pub mod unit_of_work;

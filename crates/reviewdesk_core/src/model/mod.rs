//! Review domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Batches, assets and comments are never deleted by core.
//! - Assets change only through review status transitions.

pub mod review;

//! Inventory domain model.
//!
//! # Responsibility
//! - Define the component record and its classification vocabulary.
//! - Own the write-time validation rules.
//!
//! # Invariants
//! - Every stored component is identified by a backend-assigned `ComponentId`.
//! - Deletion is permanent; there are no tombstones.

pub mod component;

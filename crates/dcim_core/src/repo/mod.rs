//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract callers program against.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce component validation before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to passing driver errors through.

pub mod component_repo;

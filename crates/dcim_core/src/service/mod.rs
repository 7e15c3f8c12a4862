//! Core use-case services.
//!
//! # Responsibility
//! - Turn transport input into repository calls.
//! - Keep CLI/HTTP front ends decoupled from storage details.

pub mod component_service;

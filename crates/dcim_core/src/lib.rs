//! Core inventory logic for DCIM components.
//! This crate is the single source of truth for component invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::component::{
    Arch, Component, ComponentId, ComponentInput, ComponentValidationError, Flag, HardwareClass,
    NetType, Role, WireEnum,
};
pub use repo::component_repo::{
    ComponentRef, ComponentRepository, RepoError, RepoResult, SqliteComponentRepository,
};
pub use service::component_service::{ComponentService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

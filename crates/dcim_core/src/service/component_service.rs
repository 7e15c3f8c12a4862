//! Component use-case service.
//!
//! # Responsibility
//! - Expose the Create/Read/Replace/Delete operations transports call.
//! - Decode wire input and run validation before storage is touched.
//! - Delegate persistence to an injected repository.
//!
//! # Invariants
//! - Validation always runs before any repository write call.
//! - Replace and delete address components by Uid only.
//! - Repository outcomes are returned unchanged.

use crate::error::ErrorKind;
use crate::model::component::{Component, ComponentId, ComponentInput, ComponentValidationError};
use crate::repo::component_repo::{ComponentRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from component service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Body or identifier could not be decoded at all.
    MalformedInput(String),
    /// Decoded input broke a validation rule.
    Validation(ComponentValidationError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInput(message) => write!(f, "malformed input: {message}"),
            Self::Validation(err) => write!(f, "invalid component: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedInput(_) => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ComponentValidationError> for ServiceError {
    fn from(value: ComponentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service over an injected component repository.
pub struct ComponentService<R: ComponentRepository> {
    repo: R,
}

impl<R: ComponentRepository> ComponentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create: decodes a JSON body, validates it and inserts it.
    ///
    /// Returns the stored component including its new Uid. A `uid` key in
    /// the body is ignored.
    pub fn create(&self, body: &str) -> ServiceResult<Component> {
        let mut component = decode_component(body)?;
        self.insert_component(&mut component)?;
        Ok(component)
    }

    /// Read: loads one component by Uid or xname.
    pub fn read(&self, identifier: &str) -> ServiceResult<Component> {
        if identifier.trim().is_empty() {
            return Err(ServiceError::MalformedInput(
                "identifier must not be blank".to_string(),
            ));
        }
        Ok(self.repo.get(identifier)?)
    }

    /// Replace: overwrites the component at Uid `identifier` with the body.
    ///
    /// Never creates a row; an unknown Uid is `NotFound`.
    pub fn replace(&self, identifier: &str, body: &str) -> ServiceResult<Component> {
        let uid = parse_uid(identifier)?;
        let mut component = decode_component(body)?;
        component.uid = Some(uid);
        self.update_component(&component)?;
        Ok(component)
    }

    /// Delete: removes the component at Uid `identifier`.
    pub fn delete(&self, identifier: &str) -> ServiceResult<ComponentId> {
        let uid = parse_uid(identifier)?;
        self.repo.delete(uid)?;
        Ok(uid)
    }

    /// Inserts an already-built component after validating it.
    pub fn insert_component(&self, component: &mut Component) -> ServiceResult<ComponentId> {
        component.validate()?;
        let uid = self.repo.insert(component).inspect_err(log_failure("create"))?;
        info!("event=component_create module=service status=ok uid={uid}");
        Ok(uid)
    }

    /// Replaces an already-built component after validating it.
    pub fn update_component(&self, component: &Component) -> ServiceResult<()> {
        component.validate_for_update()?;
        self.repo.update(component).inspect_err(log_failure("replace"))?;
        Ok(())
    }
}

fn log_failure(operation: &'static str) -> impl Fn(&RepoError) {
    move |err| {
        warn!(
            "event=component_{operation} module=service status=error error_kind={} error={}",
            err.kind(),
            err
        );
    }
}

fn decode_component(body: &str) -> ServiceResult<Component> {
    let input: ComponentInput = serde_json::from_str(body)
        .map_err(|err| ServiceError::MalformedInput(format!("could not parse JSON: {err}")))?;
    Ok(input.into_component()?)
}

fn parse_uid(identifier: &str) -> ServiceResult<ComponentId> {
    Uuid::parse_str(identifier).map_err(|err| {
        ServiceError::MalformedInput(format!("invalid uid `{identifier}`: {err}"))
    })
}

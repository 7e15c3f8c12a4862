//! Caller-facing error categories.
//!
//! Every core error type maps onto exactly one [`ErrorKind`]; transports
//! choose their external representation from the kind alone.

use std::fmt::{Display, Formatter};

/// Category of a failed core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input could not be decoded into a component or identifier.
    MalformedInput,
    /// Input decoded but broke a validation rule.
    ValidationFailure,
    /// Write rejected by the xname uniqueness constraint.
    Conflict,
    /// No row matches the identifier.
    NotFound,
    /// Storage could not be reached right now (busy, locked, cannot open).
    Unavailable,
    /// Unexpected storage or invariant failure.
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name used in logs and wire envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::ValidationFailure => "validation_failure",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

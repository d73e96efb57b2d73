//! Errors raised by the pure document engine

use thiserror::Error;
use uuid::Uuid;

/// Domain rule violations, independent of transport and storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0} is locked and cannot be modified")]
    Locked(String),

    #[error("Quotation is already approved")]
    AlreadyApproved,

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Quotation must be approved before conversion (current status: {0})")]
    NotApproved(String),

    #[error("{0} has no items")]
    NoItems(String),

    #[error("Version chain starting at {0} contains a cycle")]
    VersionCycle(Uuid),

    #[error("Version chain references missing quotation {0}")]
    BrokenChain(Uuid),

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn unknown(kind: &'static str, value: &str) -> Self {
        DomainError::UnknownValue {
            kind,
            value: value.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

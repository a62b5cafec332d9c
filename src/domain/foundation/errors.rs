//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Coarse error category that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The addressed cycle, status row or participant does not exist.
    NotFound,
    /// A unique constraint rejected a create.
    Conflict,
    /// The store or the chat transport failed; retrying later may succeed.
    TransientIo,
    /// A persisted value fell outside a fixed enumeration.
    Unrecognized,
    /// Input or transition rejected by domain rules.
    Invalid,
    /// Anything else.
    Internal,
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidStateTransition,

    // Not found errors
    CycleNotFound,
    ReportStatusNotFound,
    ParticipantNotFound,

    // Conflict errors
    CycleExists,
    ReportStatusExists,

    // Enumeration errors
    UnrecognizedReportKey,
    UnrecognizedStatus,
    UnrecognizedCycleType,

    // Infrastructure errors
    DatabaseError,
    DeliveryFailed,
    Timeout,
    InternalError,
}

impl ErrorCode {
    /// Maps the code onto the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidStateTransition => ErrorKind::Invalid,
            ErrorCode::CycleNotFound
            | ErrorCode::ReportStatusNotFound
            | ErrorCode::ParticipantNotFound => ErrorKind::NotFound,
            ErrorCode::CycleExists | ErrorCode::ReportStatusExists => ErrorKind::Conflict,
            ErrorCode::UnrecognizedReportKey
            | ErrorCode::UnrecognizedStatus
            | ErrorCode::UnrecognizedCycleType => ErrorKind::Unrecognized,
            ErrorCode::DatabaseError | ErrorCode::DeliveryFailed | ErrorCode::Timeout => {
                ErrorKind::TransientIo
            }
            ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::CycleNotFound => "CYCLE_NOT_FOUND",
            ErrorCode::ReportStatusNotFound => "REPORT_STATUS_NOT_FOUND",
            ErrorCode::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            ErrorCode::CycleExists => "CYCLE_EXISTS",
            ErrorCode::ReportStatusExists => "REPORT_STATUS_EXISTS",
            ErrorCode::UnrecognizedReportKey => "UNRECOGNIZED_REPORT_KEY",
            ErrorCode::UnrecognizedStatus => "UNRECOGNIZED_STATUS",
            ErrorCode::UnrecognizedCycleType => "UNRECOGNIZED_CYCLE_TYPE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::DeliveryFailed => "DELIVERY_FAILED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a database error from any displayable cause.
    pub fn database(context: &str, cause: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, format!("{}: {}", context, cause))
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientIo
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

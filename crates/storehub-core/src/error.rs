//! # Error Types
//!
//! Domain-specific error types for storehub-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ValidationError   - one violated field (field + message)              │
//! │  ValidationErrors  - every violated field of one validation pass       │
//! │  StoreError        - what every service/repository call fails with     │
//! │  ErrorKind         - stable, comparable category of a StoreError       │
//! │                                                                         │
//! │  Flow: ValidationErrors → StoreError::InvalidData / InvalidFilter      │
//! │        sqlx::Error      → StoreError::{NotFound, InvalidForeignKey,    │
//! │                                        Storage { op, .. }}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, ID, version)
//! 3. Callers branch on [`StoreError::kind`], never on message text
//! 4. Storage failures keep the driver error as `source()`

use std::fmt;

use thiserror::Error;

use crate::types::SaleStatus;

/// Boxed driver error carried by storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Validation Error
// =============================================================================

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or positive.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// One value is larger than the value that bounds it.
    #[error("{field} must not exceed {bound}")]
    Exceeds { field: String, bound: String },

    /// A min/max pair is out of order.
    #[error("{field} must not be greater than {max_field}")]
    RangeInverted { field: String, max_field: String },

    /// Timestamp lies after the validation clock.
    #[error("{field} must not be in the future")]
    InFuture { field: String },

    /// Field may only change through a dedicated operation.
    #[error("{field} cannot be changed by a generic update")]
    ReadOnly { field: String },

    /// A derived amount is too large to represent.
    #[error("{field} is out of range")]
    Overflow { field: String },

    /// A derived amount does not match its inputs (values in cents).
    #[error("{field} must equal {expected}, got {actual}")]
    Mismatch {
        field: String,
        expected: i64,
        actual: i64,
    },
}

impl ValidationError {
    /// Name of the field this error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Exceeds { field, .. }
            | ValidationError::RangeInverted { field, .. }
            | ValidationError::InFuture { field }
            | ValidationError::ReadOnly { field }
            | ValidationError::Overflow { field }
            | ValidationError::Mismatch { field, .. } => field,
        }
    }
}

/// Every violation found by one validation pass.
///
/// Validators keep going after the first failure so that a client can fix
/// all fields in a single round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns true if any error names `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    /// `Ok(())` when nothing was collected, the collection otherwise.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Stable failure category.
///
/// ## Usage
/// ```rust
/// use storehub_core::{ErrorKind, StoreError};
///
/// let err = StoreError::NotFound { entity: "sale", id: 7 };
/// assert!(err.is(ErrorKind::NotFound));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ZeroId,
    InvalidData,
    NotFound,
    VersionConflict,
    InvalidForeignKey,
    Get,
    Create,
    Update,
    Delete,
    Scan,
    Iterate,
    InvalidFilter,
    InvalidLimit,
    InvalidOffset,
    InvalidOrderField,
    InvalidOrderDirection,
}

/// The storage operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    Get,
    Create,
    Update,
    Delete,
    /// Decoding a fetched row into an entity.
    Scan,
    /// Advancing the result cursor.
    Iterate,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageOp::Get => "get",
            StorageOp::Create => "create",
            StorageOp::Update => "update",
            StorageOp::Delete => "delete",
            StorageOp::Scan => "scan",
            StorageOp::Iterate => "iterate",
        };
        f.write_str(s)
    }
}

impl From<StorageOp> for ErrorKind {
    fn from(op: StorageOp) -> Self {
        match op {
            StorageOp::Get => ErrorKind::Get,
            StorageOp::Create => ErrorKind::Create,
            StorageOp::Update => ErrorKind::Update,
            StorageOp::Delete => ErrorKind::Delete,
            StorageOp::Scan => ErrorKind::Scan,
            StorageOp::Iterate => ErrorKind::Iterate,
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors returned by repositories and services.
///
/// ## Retry Policy
/// Nothing in this workspace retries. `VersionConflict` means the caller
/// read a stale row: re-fetch (or call `get_version_by_id`), reapply the
/// change and submit again, with a bounded number of attempts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An identifier argument was zero or negative.
    #[error("{entity} id must be positive, got {id}")]
    ZeroId { entity: &'static str, id: i64 },

    /// Structural or business-rule validation failed.
    #[error("invalid {entity}: {errors}")]
    InvalidData {
        entity: &'static str,
        errors: ValidationErrors,
    },

    /// A lifecycle operation was attempted from a state that does not allow it.
    #[error("{message} (sale {sale_id} is {status})")]
    InvalidTransition {
        sale_id: i64,
        status: SaleStatus,
        message: &'static str,
    },

    /// No row matched.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The row exists but its version is no longer the one the caller read.
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        entity: &'static str,
        id: i64,
        expected: i32,
    },

    /// Storage rejected a write because of a dangling reference.
    #[error("{entity} references a missing record: {source}")]
    InvalidForeignKey {
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    /// Generic storage failure.
    #[error("failed to {op} {entity}: {source}")]
    Storage {
        op: StorageOp,
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    /// Filter shape validation failed.
    #[error("invalid filter: {0}")]
    InvalidFilter(ValidationErrors),

    #[error("limit must not be negative, got {0}")]
    InvalidLimit(i64),

    #[error("offset must be at most {max}, got {offset}")]
    InvalidOffset { offset: i64, max: i64 },

    #[error("cannot sort by {0:?}")]
    InvalidOrderField(String),

    #[error("sort order must be asc or desc, got {0:?}")]
    InvalidOrderDirection(String),
}

impl StoreError {
    /// Wraps a driver error as a generic storage failure.
    pub fn storage(
        op: StorageOp,
        entity: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        StoreError::Storage {
            op,
            entity,
            source: source.into(),
        }
    }

    /// The stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ZeroId { .. } => ErrorKind::ZeroId,
            StoreError::InvalidData { .. } | StoreError::InvalidTransition { .. } => {
                ErrorKind::InvalidData
            }
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::VersionConflict { .. } => ErrorKind::VersionConflict,
            StoreError::InvalidForeignKey { .. } => ErrorKind::InvalidForeignKey,
            StoreError::Storage { op, .. } => (*op).into(),
            StoreError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            StoreError::InvalidLimit(_) => ErrorKind::InvalidLimit,
            StoreError::InvalidOffset { .. } => ErrorKind::InvalidOffset,
            StoreError::InvalidOrderField(_) => ErrorKind::InvalidOrderField,
            StoreError::InvalidOrderDirection(_) => ErrorKind::InvalidOrderDirection,
        }
    }

    /// Shorthand for `self.kind() == kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Field-level errors, when this error came out of a validator.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            StoreError::InvalidData { errors, .. } | StoreError::InvalidFilter(errors) => {
                Some(errors)
            }
            _ => None,
        }
    }
}

/// Convenience type alias for Results with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "payment_type".to_string(),
        };
        assert_eq!(err.to_string(), "payment_type is required");
        assert_eq!(err.field(), "payment_type");

        let err = ValidationError::RangeInverted {
            field: "min_total_amount".to_string(),
            max_field: "max_total_amount".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "min_total_amount must not be greater than max_total_amount"
        );
    }

    #[test]
    fn test_validation_errors_aggregate() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.push(ValidationError::MustBePositive {
            field: "user_id".to_string(),
        });
        errors.push(ValidationError::TooLong {
            field: "notes".to_string(),
            max: 500,
        });

        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("notes"));
        assert_eq!(
            errors.to_string(),
            "user_id must be positive; notes must be at most 500 characters"
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_kind_mapping() {
        let err = StoreError::InvalidTransition {
            sale_id: 1,
            status: SaleStatus::Completed,
            message: "only active sales can be canceled",
        };
        assert!(err.is(ErrorKind::InvalidData));

        let err = StoreError::storage(StorageOp::Scan, "sale", "bad column");
        assert_eq!(err.kind(), ErrorKind::Scan);
        assert_eq!(err.to_string(), "failed to scan sale: bad column");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("bad column"));
    }
}

//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-store errors (separate crate)                                   │
//! │  ├── StoreError       - Storage, not-found, corrupt documents          │
//! │  └── ExportError      - Share artifact rendering (never fatal)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → UI message           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A zero-subtotal profit margin is not an error at all: it is the
//! [`Margin::Undefined`](crate::calc::Margin::Undefined) sentinel.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record still marked as in progress was handed to an operation that
    /// only accepts closed invoices (ledger append, export).
    #[error("Invoice {invoice} is still open")]
    OpenRecord { invoice: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These never mutate persisted state: every check runs before any write.
/// The `field` names match the persisted document keys so the UI can
/// highlight the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., an invoice number that is not `INV-dddd`).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Returns the name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # Store Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / serde_json::Error / ValidationError                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UI layer shows the message; every variant is recoverable              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Storage operation errors.
///
/// None of these is fatal: a failed write leaves both the stored documents
/// and the in-memory session exactly as they were.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key-value store could not read or write.
    ///
    /// ## When This Occurs
    /// - Database file can't be opened
    /// - Disk full
    /// - Pool closed or timed out
    #[error("Storage error: {0}")]
    Storage(String),

    /// Index or id does not exist.
    ///
    /// ## When This Occurs
    /// - `delete_at` past the end of the ledger
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A stored document is not valid JSON for its key.
    #[error("Stored document '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    /// Input failed validation; nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Domain rule violated (e.g. appending a record that is still open).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A document could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Corrupt error for a stored key.
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// True for input errors the user can fix by editing the draft.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::Core(CoreError::Validation(_))
        )
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolTimedOut   → Storage("pool timed out")
/// sqlx::Error::PoolClosed     → Storage("pool is closed")
/// sqlx::Error::Database       → Storage(<sqlite message>)
/// Other                       → Storage(<display>)
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Storage("Connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => StoreError::Storage("Pool is closed".to_string()),
            sqlx::Error::Database(db_err) => StoreError::Storage(db_err.message().to_string()),
            _ => StoreError::Storage(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

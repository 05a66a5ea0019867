//! # Database Error Types
//!
//! Store failures, the operation-level error callers receive, and the
//! serializable report handed to the presentation layer.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ──► DbError ──┐                                           │
//! │                            ├──► OpsError ──► retry? ──► ErrorReport    │
//! │  CoreError ────────────────┘        │                                   │
//! │                                     └── kind() == ConcurrentModification│
//! │                                         reruns the whole transaction    │
//! │                                                                         │
//! │  ErrorReport never carries SQL text, constraint names or file paths.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use resort_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

// =============================================================================
// Store Errors
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second bill for the same booking
    /// - Duplicate room number or voucher code
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (quantity invariant, status domain).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// SQLITE_BUSY / SQLITE_LOCKED: another writer holds the lock.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// SQLite primary and extended result codes for lock contention.
const BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Busy / Unique / ForeignKey / Check / QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let code = db_err.code();

                if code.as_deref().is_some_and(|c| BUSY_CODES.contains(&c))
                    || msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::Busy(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Operation Errors
// =============================================================================

/// What every engine operation returns on failure.
#[derive(Debug, Error)]
pub enum OpsError {
    /// A business rule rejected the request.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The Ledger Store failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<sqlx::Error> for OpsError {
    fn from(err: sqlx::Error) -> Self {
        OpsError::Store(DbError::from(err))
    }
}

impl From<ValidationError> for OpsError {
    fn from(err: ValidationError) -> Self {
        OpsError::Domain(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Error kinds as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    InsufficientBalance,
    RoomUnavailable,
    VoucherExpired,
    VoucherNotFound,
    ConcurrentModification,
    InvalidPaymentAmount,
    ValidationError,
    /// Anything the store failed at that isn't one of the above.
    Internal,
}

impl OpsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::Domain(err) => match err {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                CoreError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                CoreError::RoomUnavailable { .. } => ErrorKind::RoomUnavailable,
                CoreError::VoucherExpired { .. } => ErrorKind::VoucherExpired,
                CoreError::VoucherNotFound { .. } => ErrorKind::VoucherNotFound,
                CoreError::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
                CoreError::InvalidPaymentAmount { .. } => ErrorKind::InvalidPaymentAmount,
                CoreError::Validation(_) => ErrorKind::ValidationError,
            },
            OpsError::Store(err) => match err {
                DbError::Busy(_) => ErrorKind::ConcurrentModification,
                DbError::NotFound { .. } => ErrorKind::NotFound,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Identifier of the offending entity, when one is known.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            OpsError::Domain(err) => err.entity_id(),
            OpsError::Store(DbError::NotFound { id, .. }) => Some(id),
            OpsError::Store(_) => None,
        }
    }

    /// Only contention is worth rerunning.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModification
    }

    /// Shorthand for a version check that matched no row.
    pub(crate) fn concurrent(entity: &str, id: &str) -> Self {
        OpsError::Domain(CoreError::concurrent(entity, id))
    }

    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        OpsError::Domain(CoreError::not_found(entity, id))
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// The failure shape handed to callers.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_BALANCE",
///   "message": "Insufficient balance on 6f1c…: available 3, requested 4",
///   "entityId": "6f1c…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorKind,
    pub message: String,
    pub entity_id: Option<String>,
}

impl From<&OpsError> for ErrorReport {
    fn from(err: &OpsError) -> Self {
        let code = err.kind();
        let message = match err {
            OpsError::Domain(e) => e.to_string(),
            OpsError::Store(DbError::NotFound { entity, id }) => {
                format!("{} not found: {}", entity, id)
            }
            OpsError::Store(DbError::Busy(_)) => {
                "The record is being changed by someone else, please retry".to_string()
            }
            OpsError::Store(e) => {
                error!(error = %e, "Store error");
                "A storage error occurred".to_string()
            }
        };

        ErrorReport {
            code,
            message,
            entity_id: err.entity_id().map(str::to_string),
        }
    }
}

impl From<OpsError> for ErrorReport {
    fn from(err: OpsError) -> Self {
        ErrorReport::from(&err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

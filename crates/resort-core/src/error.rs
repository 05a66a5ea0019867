//! # Error Types
//!
//! Domain-specific error types for resort-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resort-core errors (this file)                                        │
//! │  ├── CoreError        - State machine and billing rule violations      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  resort-db errors (separate crate)                                     │
//! │  ├── DbError          - Ledger Store failures                          │
//! │  └── OpsError         - CoreError | DbError, what callers receive      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OpsError → ErrorReport            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the identifier of the entity that caused it, so the
//! presentation layer can point the operator at the offending record without
//! seeing any store internals.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The requested state machine edge is not permitted.
    ///
    /// ## When This Occurs
    /// - Completing a cancelled service
    /// - Paying a food order that has not been billed
    /// - Checking in a booking that is already checked out
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Inventory use/return (or stock draw) exceeds what is available.
    ///
    /// ## User Workflow
    /// ```text
    /// Housekeeper records use of 4 towels
    ///      │
    ///      ▼
    /// balance = assigned 5 - used 2 - returned 0 = 3
    ///      │
    ///      ▼
    /// InsufficientBalance { available: 3, requested: 4 }
    /// ```
    #[error("Insufficient balance on {assignment_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        assignment_id: String,
        available: i64,
        requested: i64,
    },

    /// Booking requested a room that is not `available`.
    #[error("Room {room_id} is not available (currently {status})")]
    RoomUnavailable { room_id: String, status: String },

    /// Voucher exists but `now >= expiry_date`.
    #[error("Voucher {code} has expired")]
    VoucherExpired { code: String },

    /// No voucher with this code.
    #[error("Voucher not found: {code}")]
    VoucherNotFound { code: String },

    /// Row changed underneath the operation (version mismatch or lock
    /// contention). The only retryable kind.
    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification { entity: String, id: String },

    /// Payment amounts supplied at checkout do not settle the bill.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        CoreError::InvalidTransition {
            entity: entity.into(),
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a ConcurrentModification error.
    pub fn concurrent(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::ConcurrentModification {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Identifier of the entity the error is about, if it names one.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            CoreError::NotFound { id, .. }
            | CoreError::InvalidTransition { id, .. }
            | CoreError::ConcurrentModification { id, .. } => Some(id),
            CoreError::InsufficientBalance { assignment_id, .. } => Some(assignment_id),
            CoreError::RoomUnavailable { room_id, .. } => Some(room_id),
            CoreError::VoucherExpired { code } | CoreError::VoucherNotFound { code } => Some(code),
            CoreError::InvalidPaymentAmount { .. } | CoreError::Validation(_) => None,
        }
    }

    /// Transient contention; safe to rerun the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ConcurrentModification { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Referenced catalog entry exists but cannot be used.
    #[error("{field} '{value}' is not available")]
    Unavailable { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientBalance {
            assignment_id: "ia-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance on ia-1: available 3, requested 5"
        );

        let err =
            CoreError::invalid_transition("ServiceAssignment", "sa-1", "completed", "cancelled");
        assert_eq!(
            err.to_string(),
            "ServiceAssignment sa-1 cannot move from completed to cancelled"
        );
    }

    #[test]
    fn test_entity_id_is_reported() {
        let err = CoreError::RoomUnavailable {
            room_id: "room-101".to_string(),
            status: "booked".to_string(),
        };
        assert_eq!(err.entity_id(), Some("room-101"));

        let err = CoreError::VoucherExpired {
            code: "SUMMER10".to_string(),
        };
        assert_eq!(err.entity_id(), Some("SUMMER10"));
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        assert!(CoreError::concurrent("FoodOrder", "fo-1").is_retryable());
        assert!(!CoreError::not_found("FoodOrder", "fo-1").is_retryable());
        assert!(!CoreError::VoucherNotFound {
            code: "X".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "guest_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.entity_id(), None);
    }
}

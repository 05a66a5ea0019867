//! # Validation Module
//!
//! Input checks shared by every write path.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE                                                   │
//! │  ├── Field formats (guest name, mobile, email, voucher code)           │
//! │  └── Numeric ranges (quantities, prices, rates)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: State machines (occupancy, service, food, inventory)         │
//! │  └── Allowed transitions and balances                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on quantities                                   │
//! │  ├── UNIQUE (bills.booking_id, vouchers.code, rooms.room_number)       │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resort_core::validation::{validate_mobile, validate_quantity};
//!
//! validate_mobile("+91 98450 12345").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a guest name: non-empty, at most 120 characters.
pub fn validate_guest_name(name: &str) -> ValidationResult<()> {
    required("guest_name", name, 120)
}

/// Validates a catalog display name (room type, food item, service,
/// employee, inventory item).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, 200)
}

/// Validates a mobile number.
///
/// ## Rules
/// - Optional leading `+`
/// - Digits, spaces and hyphens only
/// - 10 to 15 digits in total
///
/// ## Example
/// ```rust
/// use resort_core::validation::validate_mobile;
///
/// assert!(validate_mobile("9845012345").is_ok());
/// assert!(validate_mobile("+91 98450-12345").is_ok());
/// assert!(validate_mobile("call me").is_err());
/// ```
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    required("guest_mobile", mobile, 20)?;

    let mobile = mobile.trim();
    let body = mobile.strip_prefix('+').unwrap_or(mobile);
    let invalid = || ValidationError::InvalidFormat {
        field: "guest_mobile".to_string(),
        reason: "must be 10-15 digits, optionally prefixed with +".to_string(),
    };

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(invalid());
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(10..=15).contains(&digits) {
        return Err(invalid());
    }

    Ok(())
}

/// Validates an email address. Shape only: one `@`, a non-empty local part,
/// and a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("guest_email", email, 254)?;

    let email = email.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: "guest_email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.contains(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a voucher code.
///
/// ## Rules
/// - 1 to 32 characters
/// - ASCII letters, digits, hyphens, underscores
pub fn validate_voucher_code(code: &str) -> ValidationResult<()> {
    required("voucher_code", code, 32)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "voucher_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an inventory movement (assign, use, return). Must be positive;
/// there is no upper cap, stock bounds the amount instead.
pub fn validate_movement_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity_on_hand".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Example
/// ```rust
/// use resort_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(15_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());      // complimentary
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount in minor units. Must be positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points: 0 to 10000 (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use resort_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_guest_name() {
        assert!(validate_guest_name("Asha Rao").is_ok());
        assert!(validate_guest_name("  ").is_err());
        assert!(validate_guest_name(&"A".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_mobile() {
        assert!(validate_mobile("9845012345").is_ok());
        assert!(validate_mobile("+91 98450 12345").is_ok());
        assert!(validate_mobile("+91-98450-12345").is_ok());

        assert!(validate_mobile("").is_err());
        assert!(validate_mobile("12345").is_err());
        assert!(validate_mobile("98450x12345").is_err());
        assert!(validate_mobile("++919845012345").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.in").is_ok());

        assert!(validate_email("asha").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("asha@localhost").is_err());
        assert!(validate_email("asha@@example.com").is_err());
        assert!(validate_email("as ha@example.com").is_err());
    }

    #[test]
    fn test_validate_voucher_code() {
        assert!(validate_voucher_code("STAY10").is_ok());
        assert!(validate_voucher_code("MONSOON_2026").is_ok());
        assert!(validate_voucher_code("").is_err());
        assert!(validate_voucher_code("TEN %").is_err());
        assert!(validate_voucher_code(&"X".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_movement_quantity() {
        assert!(validate_movement_quantity(1).is_ok());
        assert!(validate_movement_quantity(1000).is_ok());
        assert!(validate_movement_quantity(0).is_err());
        assert!(validate_movement_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(1).is_ok());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps("discount", 0).is_ok());
        assert!(validate_rate_bps("discount", 10_000).is_ok());
        assert!(validate_rate_bps("discount", 10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}

//! # Shared Domain Types
//!
//! Types used by more than one component: rates, the billing axis, payment
//! methods, and the catalog records the engine looks prices up from.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shared Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │  BillingStatus  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Unbilled       │   │  Cash           │       │
//! │  │  500 = 5% GST   │   │  Billed         │   │  Card / Upi     │       │
//! │  └─────────────────┘   │  Paid           │   │  BankTransfer   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Catalog (price lookup, snapshotted on use):                           │
//! │    FoodItem.price_cents    Service.charge_cents    Room (occupancy.rs) │
//! │    InventoryItem.quantity_on_hand                  Employee            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an immutable UUID `id`; rooms, vouchers and employees
//! also carry a human-facing business key (room number, code, name).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so GST at 5% is `Rate::from_bps(500)` and a 12.5%
/// voucher is `Rate::from_bps(1250)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for configuration input).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Billing Status
// =============================================================================

/// The billing axis, orthogonal to an entity's operational status.
///
/// Moves forward only: `Unbilled → Billed → Paid`. Service assignments stop
/// at `Billed`; food orders can additionally be marked `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    #[default]
    Unbilled,
    Billed,
    Paid,
}

impl BillingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Unbilled => "unbilled",
            BillingStatus::Billed => "billed",
            BillingStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
}

// =============================================================================
// Catalog
// =============================================================================

/// A staff member who takes orders, performs services, or holds inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Free-form role label ("housekeeping", "kitchen", "front_desk").
    pub role: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A menu item. `price_cents` is the live price; orders copy it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_available: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl FoodItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A service definition (spa, laundry, room cleaning) with a fixed charge.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Live charge; frozen onto the assignment when it completes.
    pub charge_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn charge(&self) -> Money {
        Money::from_cents(self.charge_cents)
    }
}

/// A stock-keeping inventory item (towels, toiletries, cleaning supplies).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub unit: String,
    /// Stock not currently handed out to employees.
    pub quantity_on_hand: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(500);
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(12.5).bps(), 1250);
        assert_eq!(Rate::from_percentage(5.0).bps(), 500);
    }

    #[test]
    fn test_billing_status_default_and_serde() {
        assert_eq!(BillingStatus::default(), BillingStatus::Unbilled);
        let json = serde_json::to_string(&BillingStatus::Billed).unwrap();
        assert_eq!(json, "\"billed\"");
        let method: PaymentMethod = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(method, PaymentMethod::BankTransfer);
    }
}

//! # Checkout Reconciliation
//!
//! The arithmetic half of checkout: which charges belong to the stay, what
//! they add up to, and what a voucher takes off. The transactional half
//! (locking, persisting, flipping billing flags) lives in `resort-db`.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stay_start = checked_in_at ?? check_in_date @ 00:00                   │
//! │                                                                         │
//! │  room_charge   = nights × Σ nightly rates                              │
//! │  food_charges  = Σ total (active, unbilled, created_at  ≥ stay_start)  │
//! │  service_chgs  = Σ charge (completed, unbilled, assigned_at ≥ start)   │
//! │  ───────────────────────────────────────────────────────────────────── │
//! │  gross_total   = room_charge + food_charges + service_charges          │
//! │  discount      = gross_total × voucher rate   (voucher valid: now<exp) │
//! │  net_total     = gross_total − discount                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::food::FoodOrder;
use crate::money::Money;
use crate::occupancy::{Booking, Room};
use crate::service::ServiceAssignment;
use crate::types::{PaymentMethod, Rate};
use crate::validation::validate_payment_amount;

// =============================================================================
// Voucher
// =============================================================================

/// A discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Voucher {
    pub id: String,
    pub code: String,
    /// Discount in basis points (1000 = 10%).
    pub discount_bps: u32,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    #[inline]
    pub fn rate(&self) -> Rate {
        Rate::from_bps(self.discount_bps)
    }

    /// ## Errors
    /// - `VoucherExpired` once `now >= expiry_date`
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if now >= self.expiry_date {
            return Err(CoreError::VoucherExpired {
                code: self.code.clone(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Bill
// =============================================================================

/// Inputs to a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub booking_id: String,
    pub voucher_code: Option<String>,
    /// Tenders settling the bill. Empty means settle later.
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

impl CheckoutRequest {
    pub fn new(booking_id: impl Into<String>) -> Self {
        CheckoutRequest {
            booking_id: booking_id.into(),
            voucher_code: None,
            payments: Vec::new(),
        }
    }

    pub fn with_voucher(mut self, code: impl Into<String>) -> Self {
        self.voucher_code = Some(code.into());
        self
    }

    pub fn with_payment(mut self, method: PaymentMethod, amount_cents: i64) -> Self {
        self.payments.push(PaymentInput {
            method,
            amount_cents,
            reference: None,
        });
        self
    }
}

/// One tender at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// Card auth code, UPI transaction id, etc.
    pub reference: Option<String>,
}

/// A recorded tender against a bill.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BillPayment {
    pub id: String,
    pub bill_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub verified: bool,
    #[ts(as = "Option<String>")]
    pub verified_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// The settlement of one booking. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Bill {
    pub id: String,
    pub booking_id: String,
    pub nights: i64,
    pub room_charges_cents: i64,
    pub food_charges_cents: i64,
    pub service_charges_cents: i64,
    pub gross_total_cents: i64,
    pub voucher_code: Option<String>,
    pub discount_cents: i64,
    pub net_total_cents: i64,
    #[ts(as = "String")]
    pub stay_start: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub food_order_ids: Vec<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub service_assignment_ids: Vec<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub payments: Vec<BillPayment>,
}

impl Bill {
    #[inline]
    pub fn net_total(&self) -> Money {
        Money::from_cents(self.net_total_cents)
    }
}

/// Computed totals before anything is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillBreakdown {
    pub nights: i64,
    pub room_charges: Money,
    pub food_charges: Money,
    pub service_charges: Money,
    pub gross_total: Money,
    pub discount: Money,
    pub net_total: Money,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Food orders that belong to this stay and have not been billed.
pub fn select_food_orders<'a>(
    orders: &'a [FoodOrder],
    stay_start: DateTime<Utc>,
) -> Vec<&'a FoodOrder> {
    orders
        .iter()
        .filter(|o| o.is_billable_since(stay_start))
        .collect()
}

/// Completed service assignments that belong to this stay and have not been
/// billed.
pub fn select_services<'a>(
    assignments: &'a [ServiceAssignment],
    stay_start: DateTime<Utc>,
) -> Vec<&'a ServiceAssignment> {
    assignments
        .iter()
        .filter(|s| s.is_billable_since(stay_start))
        .collect()
}

/// `nights × Σ nightly rates`.
pub fn room_charge(booking: &Booking, rooms: &[Room]) -> Money {
    let nightly: Money = rooms.iter().map(Room::nightly_rate).sum();
    nightly * booking.window().nights()
}

/// Sums the selected charges and applies the voucher, if any.
///
/// The voucher must already have been looked up; an expired one fails here
/// before any total is produced.
///
/// ## Errors
/// - `VoucherExpired` if `now >= voucher.expiry_date`
pub fn compute_breakdown(
    booking: &Booking,
    rooms: &[Room],
    food: &[&FoodOrder],
    services: &[&ServiceAssignment],
    voucher: Option<&Voucher>,
    now: DateTime<Utc>,
) -> CoreResult<BillBreakdown> {
    let room_charges = room_charge(booking, rooms);
    let food_charges: Money = food.iter().map(|o| o.total()).sum();
    let service_charges: Money = services.iter().map(|s| s.charge()).sum();
    let gross_total = room_charges + food_charges + service_charges;

    let discount = match voucher {
        Some(v) => {
            v.ensure_valid(now)?;
            gross_total.percentage(v.rate())
        }
        None => Money::zero(),
    };

    Ok(BillBreakdown {
        nights: booking.window().nights(),
        room_charges,
        food_charges,
        service_charges,
        gross_total,
        discount,
        net_total: gross_total - discount,
    })
}

/// Supplied tenders must be positive and settle the net total exactly.
///
/// ## Errors
/// - `Validation` for a non-positive tender
/// - `InvalidPaymentAmount` if the sum differs from `net_total`
pub fn validate_payments(payments: &[PaymentInput], net_total: Money) -> CoreResult<()> {
    if payments.is_empty() {
        return Ok(());
    }
    for p in payments {
        validate_payment_amount(p.amount_cents)?;
    }
    let paid: Money = payments.iter().map(|p| Money::from_cents(p.amount_cents)).sum();
    if paid != net_total {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!("payments total {} but bill is {}", paid, net_total),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

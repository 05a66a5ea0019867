//! # Food Order Billing State Machine
//!
//! Room-service orders and their path to payment.
//!
//! ## Two Axes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Activity:   active ──► cancelled        (only while unbilled)         │
//! │                                                                         │
//! │  Billing:    unbilled ──► billed ──► paid                              │
//! │                  │          │                                           │
//! │                  │          └── mark_billed again: no-op                │
//! │                  └── mark_paid: InvalidTransition                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Each line copies the food item's name and unit price; `amount`, `gst` and
//! `total` are computed once at creation with the configured GST rate and
//! never recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{BillingStatus, FoodItem, PaymentMethod, Rate};
use crate::validation::validate_quantity;
use crate::MAX_ORDER_LINES;

const ENTITY: &str = "FoodOrder";

/// Activity status of a food order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FoodOrderStatus {
    #[default]
    Active,
    Cancelled,
}

impl fmt::Display for FoodOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FoodOrderStatus::Active => "active",
            FoodOrderStatus::Cancelled => "cancelled",
        })
    }
}

/// Requested line: which item, how many.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineInput {
    pub food_item_id: String,
    pub quantity: i64,
}

/// A line of a food order with its frozen price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FoodOrderLine {
    pub id: String,
    pub order_id: String,
    pub food_item_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// A room-service order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FoodOrder {
    pub id: String,
    pub room_id: String,
    pub employee_id: String,
    /// Σ line totals, before GST.
    pub amount_cents: i64,
    pub gst_cents: i64,
    /// amount + gst.
    pub total_cents: i64,
    /// GST rate the order was priced with.
    pub gst_rate_bps: u32,
    pub status: FoodOrderStatus,
    pub billing_status: BillingStatus,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "Option<String>")]
    pub payment_time: Option<DateTime<Utc>>,
    pub bill_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub version: i64,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub lines: Vec<FoodOrderLine>,
}

/// Prices an order from catalog items paired with requested quantities.
///
/// ## Errors
/// - `Validation` for an empty order, too many lines, non-positive
///   quantities, or an item that is not available
pub fn build_order(
    room_id: &str,
    employee_id: &str,
    lines: &[(FoodItem, i64)],
    gst_rate: Rate,
    now: DateTime<Utc>,
) -> CoreResult<FoodOrder> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        }
        .into());
    }

    let order_id = Uuid::new_v4().to_string();
    let mut priced = Vec::with_capacity(lines.len());

    for (item, quantity) in lines {
        validate_quantity(*quantity)?;
        if !item.is_available {
            return Err(ValidationError::Unavailable {
                field: "food_item".to_string(),
                value: item.id.clone(),
            }
            .into());
        }

        priced.push(FoodOrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            food_item_id: item.id.clone(),
            name_snapshot: item.name.clone(),
            unit_price_cents: item.price_cents,
            quantity: *quantity,
            line_total_cents: item.price().multiply_quantity(*quantity).cents(),
        });
    }

    let amount: Money = priced
        .iter()
        .map(|l| Money::from_cents(l.line_total_cents))
        .sum();
    let gst = amount.percentage(gst_rate);

    Ok(FoodOrder {
        id: order_id,
        room_id: room_id.to_string(),
        employee_id: employee_id.to_string(),
        amount_cents: amount.cents(),
        gst_cents: gst.cents(),
        total_cents: (amount + gst).cents(),
        gst_rate_bps: gst_rate.bps(),
        status: FoodOrderStatus::Active,
        billing_status: BillingStatus::Unbilled,
        payment_method: None,
        payment_time: None,
        bill_id: None,
        created_at: now,
        updated_at: now,
        version: 0,
        lines: priced,
    })
}

impl FoodOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// `unbilled → billed`.
    ///
    /// Returns `Ok(false)` without touching the order when it is already
    /// billed or paid.
    ///
    /// ## Errors
    /// - `InvalidTransition` for a cancelled order
    pub fn mark_billed(&mut self, bill_id: Option<&str>, now: DateTime<Utc>) -> CoreResult<bool> {
        if self.billing_status != BillingStatus::Unbilled {
            return Ok(false);
        }
        if self.status == FoodOrderStatus::Cancelled {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.status,
                BillingStatus::Billed,
            ));
        }

        self.billing_status = BillingStatus::Billed;
        if let Some(bill_id) = bill_id {
            self.bill_id = Some(bill_id.to_string());
        }
        self.updated_at = now;
        Ok(true)
    }

    /// `billed → paid`, recording how and when.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless currently `billed`
    pub fn mark_paid(&mut self, method: PaymentMethod, now: DateTime<Utc>) -> CoreResult<()> {
        if self.billing_status != BillingStatus::Billed {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.billing_status,
                BillingStatus::Paid,
            ));
        }

        self.billing_status = BillingStatus::Paid;
        self.payment_method = Some(method);
        self.payment_time = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `active → cancelled`, allowed only before billing.
    ///
    /// ## Errors
    /// - `InvalidTransition` if already cancelled or already billed
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status == FoodOrderStatus::Cancelled {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.status,
                FoodOrderStatus::Cancelled,
            ));
        }
        if self.billing_status != BillingStatus::Unbilled {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.billing_status,
                FoodOrderStatus::Cancelled,
            ));
        }

        self.status = FoodOrderStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Active, unbilled, and created on or after the stay boundary.
    pub fn is_billable_since(&self, stay_start: DateTime<Utc>) -> bool {
        self.status == FoodOrderStatus::Active
            && self.billing_status == BillingStatus::Unbilled
            && self.created_at >= stay_start
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price_cents: i64) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            price_cents,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(lines: &[(FoodItem, i64)]) -> FoodOrder {
        build_order("room-101", "emp-1", lines, Rate::from_bps(500), Utc::now()).unwrap()
    }

    #[test]
    fn test_gst_on_one_thousand() {
        let o = order(&[(item("thali", 25_000), 4)]);
        assert_eq!(o.amount_cents, 100_000);
        assert_eq!(o.gst_cents, 5_000);
        assert_eq!(o.total_cents, 105_000);
        assert_eq!(o.gst_rate_bps, 500);
    }

    #[test]
    fn test_amount_sums_lines() {
        let o = order(&[(item("tea", 3_000), 2), (item("sandwich", 14_000), 1)]);
        assert_eq!(o.lines.len(), 2);
        assert_eq!(o.amount_cents, 20_000);
        assert_eq!(o.gst_cents, 1_000);
        assert_eq!(o.total_cents, 21_000);
        assert!(o.lines.iter().all(|l| l.order_id == o.id));
    }

    #[test]
    fn test_snapshot_survives_price_change() {
        let mut tea = item("tea", 3_000);
        let o = order(&[(tea.clone(), 1)]);
        tea.price_cents = 9_000;
        assert_eq!(o.lines[0].unit_price_cents, 3_000);
        assert_eq!(o.amount_cents, 3_000);
    }

    #[test]
    fn test_rejects_bad_input() {
        let now = Utc::now();
        let rate = Rate::from_bps(500);
        assert!(build_order("r", "e", &[], rate, now).is_err());
        assert!(build_order("r", "e", &[(item("x", 100), 0)], rate, now).is_err());

        let mut off_menu = item("x", 100);
        off_menu.is_available = false;
        assert!(build_order("r", "e", &[(off_menu, 1)], rate, now).is_err());
    }

    #[test]
    fn test_billing_progression() {
        let mut o = order(&[(item("tea", 3_000), 1)]);

        assert!(matches!(
            o.mark_paid(PaymentMethod::Cash, Utc::now()),
            Err(CoreError::InvalidTransition { .. })
        ));

        assert!(o.mark_billed(Some("bill-1"), Utc::now()).unwrap());
        assert!(!o.mark_billed(Some("bill-2"), Utc::now()).unwrap());
        assert_eq!(o.bill_id.as_deref(), Some("bill-1"));

        o.mark_paid(PaymentMethod::Upi, Utc::now()).unwrap();
        assert_eq!(o.billing_status, BillingStatus::Paid);
        assert_eq!(o.payment_method, Some(PaymentMethod::Upi));
        assert!(o.payment_time.is_some());

        assert!(!o.mark_billed(None, Utc::now()).unwrap());
        assert!(o.mark_paid(PaymentMethod::Cash, Utc::now()).is_err());
    }

    #[test]
    fn test_cancel_rules() {
        let mut o = order(&[(item("tea", 3_000), 1)]);
        o.cancel(Utc::now()).unwrap();
        assert_eq!(o.status, FoodOrderStatus::Cancelled);
        assert!(o.cancel(Utc::now()).is_err());
        assert!(o.mark_billed(None, Utc::now()).is_err());
        assert!(!o.is_billable_since(o.created_at));

        let mut billed = order(&[(item("tea", 3_000), 1)]);
        billed.mark_billed(None, Utc::now()).unwrap();
        assert!(billed.cancel(Utc::now()).is_err());
    }
}

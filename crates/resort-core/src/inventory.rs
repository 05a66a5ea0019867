//! # Inventory Balance Tracker
//!
//! Quantities handed to an employee (optionally for a specific service
//! assignment) and what became of them.
//!
//! ## Balance Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance = quantity_assigned − quantity_used − quantity_returned       │
//! │                                                                         │
//! │  0 ≤ quantity_used + quantity_returned ≤ quantity_assigned             │
//! │                                                                         │
//! │  assign(5)      →  used 0  returned 0  balance 5   status assigned     │
//! │  record_use(2)  →  used 2  returned 0  balance 3   status in_use       │
//! │  record_use(4)  →  InsufficientBalance { available: 3, requested: 4 }  │
//! │  record_return(3) → used 2 returned 3  balance 0   status returned     │
//! │  record_use(1)  →  InvalidTransition (fully returned, frozen)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The arithmetic here is pure; `resort-db` runs it inside a transaction
//! guarded by the row's `version` so two clerks can't spend the same balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_movement_quantity;

const ENTITY: &str = "InventoryAssignment";

/// Lifecycle of an inventory assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    #[default]
    Assigned,
    InUse,
    Returned,
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InventoryStatus::Assigned => "assigned",
            InventoryStatus::InUse => "in_use",
            InventoryStatus::Returned => "returned",
        })
    }
}

/// Quantities of one inventory item held by one employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryAssignment {
    pub id: String,
    pub employee_id: String,
    pub item_id: String,
    /// Service the stock was drawn for, if any.
    pub service_assignment_id: Option<String>,
    pub quantity_assigned: i64,
    pub quantity_used: i64,
    pub quantity_returned: i64,
    pub status: InventoryStatus,
    pub is_returned: bool,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub assigned_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub returned_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,
}

impl InventoryAssignment {
    /// Creates a fresh assignment of `quantity` units.
    ///
    /// ## Errors
    /// - `Validation` if `quantity <= 0`
    pub fn new(
        employee_id: &str,
        item_id: &str,
        service_assignment_id: Option<&str>,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validate_movement_quantity(quantity)?;

        Ok(InventoryAssignment {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            item_id: item_id.to_string(),
            service_assignment_id: service_assignment_id.map(str::to_string),
            quantity_assigned: quantity,
            quantity_used: 0,
            quantity_returned: 0,
            status: InventoryStatus::Assigned,
            is_returned: false,
            notes: None,
            assigned_at: now,
            returned_at: None,
            updated_at: now,
            version: 0,
        })
    }

    /// `assigned − used − returned`.
    #[inline]
    pub fn balance(&self) -> i64 {
        self.quantity_assigned - self.quantity_used - self.quantity_returned
    }

    /// Records consumption of `quantity` units.
    ///
    /// ## Errors
    /// - `Validation` if `quantity <= 0`
    /// - `InvalidTransition` if the assignment was already returned in full
    /// - `InsufficientBalance` if `quantity > balance`
    pub fn record_use(&mut self, quantity: i64, now: DateTime<Utc>) -> CoreResult<()> {
        self.check_mutable(quantity, InventoryStatus::InUse)?;

        self.quantity_used += quantity;
        self.status = InventoryStatus::InUse;
        self.updated_at = now;
        Ok(())
    }

    /// Records `quantity` units handed back. When the balance reaches zero the
    /// assignment is closed and frozen.
    ///
    /// ## Errors
    /// Same as [`record_use`](Self::record_use).
    pub fn record_return(
        &mut self,
        quantity: i64,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.check_mutable(quantity, InventoryStatus::Returned)?;

        self.quantity_returned += quantity;
        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            self.notes = Some(notes.to_string());
        }
        if self.balance() == 0 {
            self.is_returned = true;
            self.status = InventoryStatus::Returned;
            self.returned_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    fn check_mutable(&self, quantity: i64, target: InventoryStatus) -> CoreResult<()> {
        validate_movement_quantity(quantity)?;

        if self.is_returned {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.status,
                target,
            ));
        }

        let available = self.balance();
        if quantity > available {
            return Err(CoreError::InsufficientBalance {
                assignment_id: self.id.clone(),
                available,
                requested: quantity,
            });
        }

        Ok(())
    }
}

/// Checks a stock draw against an item's on-hand quantity.
///
/// ## Errors
/// - `InsufficientBalance` keyed by the item id if stock is short
pub fn check_stock(item_id: &str, on_hand: i64, requested: i64) -> CoreResult<()> {
    if requested > on_hand {
        return Err(CoreError::InsufficientBalance {
            assignment_id: item_id.to_string(),
            available: on_hand,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Service Assignment State Machine
//!
//! A service (spa, laundry, turndown) performed in a room by an employee.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Operational axis                      Billing axis (orthogonal)      │
//! │                                                                         │
//! │   pending ──► in_progress ──► completed       unbilled ──► billed      │
//! │      │             │                             ▲                      │
//! │      └─────────────┴──► cancelled                │                      │
//! │                                          only from completed           │
//! │   completed / cancelled are terminal                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Snapshot
//! `charge_cents` is `None` until the assignment completes; the transition
//! to `completed` copies the service's charge at that moment. Later edits to
//! the service price never reach an already-completed assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::BillingStatus;

const ENTITY: &str = "ServiceAssignment";

/// Operational status of a service assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    /// Whether `self → next` is an allowed edge.
    pub const fn can_transition_to(self, next: ServiceStatus) -> bool {
        use ServiceStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service performed in a room by an employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServiceAssignment {
    pub id: String,
    pub service_id: String,
    pub employee_id: String,
    pub room_id: String,
    pub status: ServiceStatus,
    pub billing_status: BillingStatus,
    /// Service charge frozen at completion.
    pub charge_cents: Option<i64>,
    /// Bill that settled this assignment.
    pub bill_id: Option<String>,
    #[ts(as = "String")]
    pub assigned_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl ServiceAssignment {
    /// Creates a `pending`, `unbilled` assignment.
    pub fn new(service_id: &str, employee_id: &str, room_id: &str, now: DateTime<Utc>) -> Self {
        ServiceAssignment {
            id: Uuid::new_v4().to_string(),
            service_id: service_id.to_string(),
            employee_id: employee_id.to_string(),
            room_id: room_id.to_string(),
            status: ServiceStatus::Pending,
            billing_status: BillingStatus::Unbilled,
            charge_cents: None,
            bill_id: None,
            assigned_at: now,
            completed_at: None,
            updated_at: now,
            version: 0,
        }
    }

    /// Frozen charge; zero until completed.
    pub fn charge(&self) -> Money {
        Money::from_cents(self.charge_cents.unwrap_or(0))
    }

    /// Moves the assignment along an allowed edge.
    ///
    /// `charge_at_completion` is the service's live charge, read by the
    /// caller in the same transaction; it is only recorded when `next` is
    /// `Completed`.
    ///
    /// ## Errors
    /// - `InvalidTransition` if `status → next` is not an allowed edge
    pub fn transition(
        &mut self,
        next: ServiceStatus,
        charge_at_completion: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::invalid_transition(ENTITY, &self.id, self.status, next));
        }

        if next == ServiceStatus::Completed {
            self.charge_cents = Some(charge_at_completion.cents());
            self.completed_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Marks a completed assignment as billed.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless the assignment is `completed` and
    ///   `unbilled`; cancelled, pending and in-progress work never bills
    pub fn mark_billed(&mut self, bill_id: Option<&str>, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != ServiceStatus::Completed {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.status,
                BillingStatus::Billed,
            ));
        }
        if self.billing_status != BillingStatus::Unbilled {
            return Err(CoreError::invalid_transition(
                ENTITY,
                &self.id,
                self.billing_status,
                BillingStatus::Billed,
            ));
        }

        self.billing_status = BillingStatus::Billed;
        self.bill_id = bill_id.map(str::to_string);
        self.updated_at = now;
        Ok(())
    }

    /// Completed, unbilled, and assigned on or after the stay boundary.
    pub fn is_billable_since(&self, stay_start: DateTime<Utc>) -> bool {
        self.status == ServiceStatus::Completed
            && self.billing_status == BillingStatus::Unbilled
            && self.assigned_at >= stay_start
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ALL: [ServiceStatus; 4] = [
        ServiceStatus::Pending,
        ServiceStatus::InProgress,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];

    fn assignment() -> ServiceAssignment {
        ServiceAssignment::new("svc-spa", "emp-1", "room-101", Utc::now())
    }

    #[test]
    fn test_allowed_edges() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|&from| ALL.iter().map(move |&to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (ServiceStatus::Pending, ServiceStatus::InProgress),
                (ServiceStatus::Pending, ServiceStatus::Cancelled),
                (ServiceStatus::InProgress, ServiceStatus::Completed),
                (ServiceStatus::InProgress, ServiceStatus::Cancelled),
            ]
        );
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [ServiceStatus::Completed, ServiceStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(ALL.iter().all(|&to| !terminal.can_transition_to(to)));
        }
    }

    #[test]
    fn test_completion_freezes_charge() {
        let mut sa = assignment();
        sa.transition(ServiceStatus::InProgress, Money::from_cents(9_999), Utc::now())
            .unwrap();
        assert_eq!(sa.charge_cents, None);

        sa.transition(ServiceStatus::Completed, Money::from_cents(15_000), Utc::now())
            .unwrap();
        assert_eq!(sa.charge(), Money::from_cents(15_000));
        assert!(sa.completed_at.is_some());
    }

    #[test]
    fn test_pending_cannot_skip_to_completed() {
        let mut sa = assignment();
        let err = sa
            .transition(ServiceStatus::Completed, Money::from_cents(100), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(sa.status, ServiceStatus::Pending);
    }

    #[test]
    fn test_cancelled_never_bills() {
        let mut sa = assignment();
        sa.transition(ServiceStatus::Cancelled, Money::zero(), Utc::now())
            .unwrap();
        assert!(sa.mark_billed(Some("bill-1"), Utc::now()).is_err());
        assert_eq!(sa.billing_status, BillingStatus::Unbilled);
    }

    #[test]
    fn test_mark_billed_is_forward_only() {
        let mut sa = assignment();
        sa.transition(ServiceStatus::InProgress, Money::zero(), Utc::now())
            .unwrap();
        sa.transition(ServiceStatus::Completed, Money::from_cents(500), Utc::now())
            .unwrap();

        sa.mark_billed(Some("bill-1"), Utc::now()).unwrap();
        assert_eq!(sa.billing_status, BillingStatus::Billed);
        assert_eq!(sa.bill_id.as_deref(), Some("bill-1"));
        assert!(sa.mark_billed(Some("bill-2"), Utc::now()).is_err());
    }

    #[test]
    fn test_billable_window() {
        let now = Utc::now();
        let mut sa = ServiceAssignment::new("svc", "emp", "room", now);
        sa.transition(ServiceStatus::InProgress, Money::zero(), now).unwrap();
        sa.transition(ServiceStatus::Completed, Money::from_cents(100), now)
            .unwrap();

        assert!(sa.is_billable_since(now - Duration::hours(1)));
        assert!(sa.is_billable_since(now));
        assert!(!sa.is_billable_since(now + Duration::seconds(1)));
    }
}

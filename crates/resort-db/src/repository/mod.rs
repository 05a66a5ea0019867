//! # Repository Module
//!
//! One repository per engine component. Each public method is one
//! operation, and each operation is one transaction.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pub async fn record_use(&self, id, qty)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  with_retry(engine, "inventory.record_use", || self.try_record_use())  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    SELECT row (id, …, version = 7)                                     │
//! │    resort-core transition / balance check   ── error ──► ROLLBACK      │
//! │    UPDATE … version = 8 WHERE id = ? AND version = 7                   │
//! │         └── 0 rows ──► ConcurrentModification ──► ROLLBACK, retry      │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers that take `&mut SqliteConnection` run inside the caller's
//! transaction; they never reach back to the pool.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - rooms, employees, services, menu, stock, vouchers
//! - [`BookingRepository`](booking::BookingRepository) - bookings, check-in/out, housekeeping
//! - [`ServiceRepository`](service::ServiceRepository) - service assignments
//! - [`InventoryRepository`](inventory::InventoryRepository) - inventory assignments
//! - [`FoodOrderRepository`](food_order::FoodOrderRepository) - food orders
//! - [`CheckoutRepository`](checkout::CheckoutRepository) - reconciliation and bills

use resort_core::{Clock, EngineConfig};
use sqlx::sqlite::SqliteQueryResult;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::error::{OpsError, OpsResult};

pub mod booking;
pub mod catalog;
pub mod checkout;
pub mod food_order;
pub mod inventory;
pub mod service;

/// Everything a repository needs: the pool, "now", and policy.
#[derive(Debug, Clone)]
pub(crate) struct RepoContext {
    pub(crate) pool: SqlitePool,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) engine: EngineConfig,
}

/// Turns a conditional `UPDATE … AND version = ?` that matched nothing into
/// `ConcurrentModification`.
pub(crate) fn ensure_updated(result: SqliteQueryResult, entity: &str, id: &str) -> OpsResult<()> {
    if result.rows_affected() == 0 {
        return Err(OpsError::concurrent(entity, id));
    }
    Ok(())
}

//! # Inventory Repository
//!
//! Stock handed to employees, and what came back. Every assignment draws
//! from `inventory_items.quantity_on_hand`; returns credit it.
//!
//! ```text
//!  inventory_items (on hand 50)
//!        │ assign(5)            ▲ record_return(3)
//!        ▼                      │
//!  inventory_assignments  assigned 5 / used 2 / returned 3
//! ```
//!
//! Both rows are version-guarded, and both change in the same transaction.

use resort_core::inventory::check_stock;
use resort_core::InventoryAssignment;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{OpsError, OpsResult};
use crate::repository::catalog::{fetch_employee, fetch_inventory_item};
use crate::repository::service::fetch_assignment;
use crate::repository::{ensure_updated, RepoContext};
use crate::retry::with_retry;

const SELECT_ASSIGNMENT: &str = r#"
    SELECT id, employee_id, item_id, service_assignment_id, quantity_assigned,
           quantity_used, quantity_returned, status, is_returned, notes,
           assigned_at, returned_at, updated_at, version
    FROM inventory_assignments
"#;

/// Repository for inventory assignments.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    ctx: RepoContext,
}

impl InventoryRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        InventoryRepository { ctx }
    }

    /// Hands `quantity` units of an item to an employee, optionally for a
    /// service assignment, and deducts them from stock.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown employee, item or service assignment
    /// - `Validation` for a non-positive quantity
    /// - `InsufficientBalance` if stock on hand is short
    pub async fn assign(
        &self,
        employee_id: &str,
        item_id: &str,
        quantity: i64,
        service_assignment_id: Option<&str>,
    ) -> OpsResult<InventoryAssignment> {
        with_retry(&self.ctx.engine, "inventory.assign", move || {
            self.try_assign(employee_id, item_id, quantity, service_assignment_id)
        })
        .await
    }

    async fn try_assign(
        &self,
        employee_id: &str,
        item_id: &str,
        quantity: i64,
        service_assignment_id: Option<&str>,
    ) -> OpsResult<InventoryAssignment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        fetch_employee(&mut tx, employee_id).await?;
        if let Some(sa_id) = service_assignment_id {
            fetch_assignment(&mut tx, sa_id).await?;
        }

        let assignment =
            InventoryAssignment::new(employee_id, item_id, service_assignment_id, quantity, now)?;

        let (item, version) = fetch_inventory_item(&mut tx, item_id).await?;
        check_stock(&item.id, item.quantity_on_hand, quantity)?;
        adjust_stock(&mut tx, &item.id, -quantity, version, now).await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_assignments (
                id, employee_id, item_id, service_assignment_id, quantity_assigned,
                quantity_used, quantity_returned, status, is_returned, notes,
                assigned_at, returned_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&assignment.id)
        .bind(&assignment.employee_id)
        .bind(&assignment.item_id)
        .bind(&assignment.service_assignment_id)
        .bind(assignment.quantity_assigned)
        .bind(assignment.quantity_used)
        .bind(assignment.quantity_returned)
        .bind(assignment.status)
        .bind(assignment.is_returned)
        .bind(&assignment.notes)
        .bind(assignment.assigned_at)
        .bind(assignment.returned_at)
        .bind(assignment.updated_at)
        .bind(assignment.version)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            assignment_id = %assignment.id,
            item = %item.name,
            employee_id = %employee_id,
            quantity,
            remaining = item.quantity_on_hand - quantity,
            "Inventory assigned"
        );

        Ok(assignment)
    }

    /// Records units consumed from an assignment.
    ///
    /// ## Errors
    /// - `InsufficientBalance` if `quantity` exceeds the remaining balance
    /// - `InvalidTransition` once the assignment has been fully returned
    pub async fn record_use(&self, id: &str, quantity: i64) -> OpsResult<InventoryAssignment> {
        with_retry(&self.ctx.engine, "inventory.record_use", move || {
            self.try_record_use(id, quantity)
        })
        .await
    }

    async fn try_record_use(&self, id: &str, quantity: i64) -> OpsResult<InventoryAssignment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut assignment = fetch_inventory_assignment(&mut tx, id).await?;
        assignment.record_use(quantity, now)?;
        save_inventory_assignment(&mut tx, &mut assignment).await?;

        tx.commit().await?;

        debug!(
            assignment_id = %id,
            quantity,
            balance = assignment.balance(),
            "Inventory use recorded"
        );

        Ok(assignment)
    }

    /// Records units handed back and credits them to stock. The assignment
    /// closes when its balance reaches zero.
    ///
    /// ## Errors
    /// Same as [`record_use`](Self::record_use).
    pub async fn record_return(
        &self,
        id: &str,
        quantity: i64,
        notes: Option<&str>,
    ) -> OpsResult<InventoryAssignment> {
        with_retry(&self.ctx.engine, "inventory.record_return", move || {
            self.try_record_return(id, quantity, notes)
        })
        .await
    }

    async fn try_record_return(
        &self,
        id: &str,
        quantity: i64,
        notes: Option<&str>,
    ) -> OpsResult<InventoryAssignment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut assignment = fetch_inventory_assignment(&mut tx, id).await?;
        assignment.record_return(quantity, notes, now)?;
        save_inventory_assignment(&mut tx, &mut assignment).await?;

        let (item, version) = fetch_inventory_item(&mut tx, &assignment.item_id).await?;
        adjust_stock(&mut tx, &item.id, quantity, version, now).await?;

        tx.commit().await?;

        info!(
            assignment_id = %id,
            quantity,
            balance = assignment.balance(),
            closed = assignment.is_returned,
            "Inventory returned"
        );

        Ok(assignment)
    }

    /// `assigned − used − returned` for one assignment.
    pub async fn balance(&self, id: &str) -> OpsResult<i64> {
        Ok(self.get(id).await?.balance())
    }

    pub async fn get(&self, id: &str) -> OpsResult<InventoryAssignment> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_inventory_assignment(&mut conn, id).await
    }

    pub async fn list_by_employee(&self, employee_id: &str) -> OpsResult<Vec<InventoryAssignment>> {
        let sql = format!("{SELECT_ASSIGNMENT} WHERE employee_id = ?1 ORDER BY assigned_at, id");
        let rows = sqlx::query_as::<_, InventoryAssignment>(&sql)
            .bind(employee_id)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_service_assignment(
        &self,
        service_assignment_id: &str,
    ) -> OpsResult<Vec<InventoryAssignment>> {
        let sql = format!(
            "{SELECT_ASSIGNMENT} WHERE service_assignment_id = ?1 ORDER BY assigned_at, id"
        );
        let rows = sqlx::query_as::<_, InventoryAssignment>(&sql)
            .bind(service_assignment_id)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn fetch_inventory_assignment(
    conn: &mut SqliteConnection,
    id: &str,
) -> OpsResult<InventoryAssignment> {
    let sql = format!("{SELECT_ASSIGNMENT} WHERE id = ?1");
    sqlx::query_as::<_, InventoryAssignment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| OpsError::not_found("InventoryAssignment", id))
}

async fn save_inventory_assignment(
    conn: &mut SqliteConnection,
    assignment: &mut InventoryAssignment,
) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory_assignments SET
            quantity_used = ?1,
            quantity_returned = ?2,
            status = ?3,
            is_returned = ?4,
            notes = ?5,
            returned_at = ?6,
            updated_at = ?7,
            version = version + 1
        WHERE id = ?8 AND version = ?9
        "#,
    )
    .bind(assignment.quantity_used)
    .bind(assignment.quantity_returned)
    .bind(assignment.status)
    .bind(assignment.is_returned)
    .bind(&assignment.notes)
    .bind(assignment.returned_at)
    .bind(assignment.updated_at)
    .bind(&assignment.id)
    .bind(assignment.version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "InventoryAssignment", &assignment.id)?;
    assignment.version += 1;
    Ok(())
}

async fn adjust_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    delta: i64,
    version: i64,
    now: chrono::DateTime<chrono::Utc>,
) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory_items SET
            quantity_on_hand = quantity_on_hand + ?1,
            updated_at = ?2,
            version = version + 1
        WHERE id = ?3 AND version = ?4
        "#,
    )
    .bind(delta)
    .bind(now)
    .bind(item_id)
    .bind(version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "InventoryItem", item_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Food Order Repository
//!
//! Room-service orders. Prices and GST are fixed when the order is placed;
//! later menu edits never reach an existing order.
//!
//! ## Billing Lifecycle
//! ```text
//!   create ──► active/unbilled ──► billed ──► paid
//!                   │
//!                   └──► cancelled (only while unbilled)
//! ```

use resort_core::food::build_order;
use resort_core::{FoodOrder, FoodOrderLine, OrderLineInput, PaymentMethod};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{OpsError, OpsResult};
use crate::repository::catalog::{fetch_employee, fetch_food_item, fetch_room};
use crate::repository::{ensure_updated, RepoContext};
use crate::retry::with_retry;

const SELECT_ORDER: &str = r#"
    SELECT id, room_id, employee_id, amount_cents, gst_cents, total_cents,
           gst_rate_bps, status, billing_status, payment_method, payment_time,
           bill_id, created_at, updated_at, version
    FROM food_orders
"#;

/// Repository for food orders and their lines.
#[derive(Debug, Clone)]
pub struct FoodOrderRepository {
    ctx: RepoContext,
}

impl FoodOrderRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        FoodOrderRepository { ctx }
    }

    /// Places an order for a room, priced from the current menu at the
    /// configured GST rate.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown room, employee or food item
    /// - `Validation` for no lines, too many lines, a bad quantity, or an
    ///   unavailable item
    pub async fn create(
        &self,
        room_id: &str,
        employee_id: &str,
        lines: &[OrderLineInput],
    ) -> OpsResult<FoodOrder> {
        with_retry(&self.ctx.engine, "food_order.create", move || {
            self.try_create(room_id, employee_id, lines)
        })
        .await
    }

    async fn try_create(
        &self,
        room_id: &str,
        employee_id: &str,
        lines: &[OrderLineInput],
    ) -> OpsResult<FoodOrder> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        fetch_room(&mut tx, room_id).await?;
        fetch_employee(&mut tx, employee_id).await?;

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let item = fetch_food_item(&mut tx, &line.food_item_id).await?;
            priced.push((item, line.quantity));
        }

        let order = build_order(room_id, employee_id, &priced, self.ctx.engine.gst_rate, now)?;

        sqlx::query(
            r#"
            INSERT INTO food_orders (
                id, room_id, employee_id, amount_cents, gst_cents, total_cents,
                gst_rate_bps, status, billing_status, payment_method, payment_time,
                bill_id, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&order.id)
        .bind(&order.room_id)
        .bind(&order.employee_id)
        .bind(order.amount_cents)
        .bind(order.gst_cents)
        .bind(order.total_cents)
        .bind(order.gst_rate_bps)
        .bind(order.status)
        .bind(order.billing_status)
        .bind(order.payment_method)
        .bind(order.payment_time)
        .bind(&order.bill_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.version)
        .execute(&mut *tx)
        .await?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO food_order_lines (
                    id, order_id, food_item_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.food_item_id)
            .bind(&line.name_snapshot)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            room_id = %room_id,
            lines = order.lines.len(),
            total_cents = order.total_cents,
            "Food order created"
        );

        Ok(order)
    }

    /// Marks orders billed outside a checkout. Billed, paid ids are left
    /// alone. Returns how many changed.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidTransition` for a cancelled order; nothing is written
    pub async fn mark_billed(&self, ids: &[String]) -> OpsResult<usize> {
        with_retry(&self.ctx.engine, "food_order.mark_billed", move || {
            self.try_mark_billed(ids)
        })
        .await
    }

    async fn try_mark_billed(&self, ids: &[String]) -> OpsResult<usize> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut changed = 0;
        for id in ids {
            let mut order = fetch_order(&mut tx, id).await?;
            if order.mark_billed(None, now)? {
                save_order(&mut tx, &mut order).await?;
                changed += 1;
            } else {
                debug!(order_id = %id, "Already billed, skipping");
            }
        }

        tx.commit().await?;

        info!(requested = ids.len(), changed, "Food orders billed");
        Ok(changed)
    }

    /// Settles a billed order.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless the order is `billed`
    pub async fn mark_paid(&self, id: &str, method: PaymentMethod) -> OpsResult<FoodOrder> {
        with_retry(&self.ctx.engine, "food_order.mark_paid", move || {
            self.try_mark_paid(id, method)
        })
        .await
    }

    async fn try_mark_paid(&self, id: &str, method: PaymentMethod) -> OpsResult<FoodOrder> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut order = fetch_order(&mut tx, id).await?;
        order.mark_paid(method, now)?;
        save_order(&mut tx, &mut order).await?;
        order.lines = fetch_lines(&mut tx, id).await?;

        tx.commit().await?;

        info!(order_id = %id, method = ?method, "Food order paid");
        Ok(order)
    }

    /// Cancels an active, unbilled order.
    pub async fn cancel(&self, id: &str) -> OpsResult<FoodOrder> {
        with_retry(&self.ctx.engine, "food_order.cancel", move || self.try_cancel(id)).await
    }

    async fn try_cancel(&self, id: &str) -> OpsResult<FoodOrder> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut order = fetch_order(&mut tx, id).await?;
        order.cancel(now)?;
        save_order(&mut tx, &mut order).await?;
        order.lines = fetch_lines(&mut tx, id).await?;

        tx.commit().await?;

        info!(order_id = %id, "Food order cancelled");
        Ok(order)
    }

    /// Loads an order with its lines.
    pub async fn get(&self, id: &str) -> OpsResult<FoodOrder> {
        let mut conn = self.ctx.pool.acquire().await?;
        let mut order = fetch_order(&mut conn, id).await?;
        order.lines = fetch_lines(&mut conn, id).await?;
        Ok(order)
    }

    /// Orders for a room, oldest first, without lines.
    pub async fn list_by_room(&self, room_id: &str) -> OpsResult<Vec<FoodOrder>> {
        let sql = format!("{SELECT_ORDER} WHERE room_id = ?1 ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, FoodOrder>(&sql)
            .bind(room_id)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> OpsResult<FoodOrder> {
    let sql = format!("{SELECT_ORDER} WHERE id = ?1");
    sqlx::query_as::<_, FoodOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| OpsError::not_found("FoodOrder", id))
}

/// Active, unbilled orders for one room; the caller applies the stay window.
pub(crate) async fn fetch_unbilled_for_room(
    conn: &mut SqliteConnection,
    room_id: &str,
) -> OpsResult<Vec<FoodOrder>> {
    let sql = format!(
        "{SELECT_ORDER} WHERE room_id = ?1 AND status = 'active' AND billing_status = 'unbilled' ORDER BY created_at, id"
    );
    let rows = sqlx::query_as::<_, FoodOrder>(&sql)
        .bind(room_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn fetch_lines(conn: &mut SqliteConnection, order_id: &str) -> OpsResult<Vec<FoodOrderLine>> {
    let lines = sqlx::query_as::<_, FoodOrderLine>(
        r#"
        SELECT id, order_id, food_item_id, name_snapshot,
               unit_price_cents, quantity, line_total_cents
        FROM food_order_lines
        WHERE order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub(crate) async fn save_order(
    conn: &mut SqliteConnection,
    order: &mut FoodOrder,
) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE food_orders SET
            status = ?1,
            billing_status = ?2,
            payment_method = ?3,
            payment_time = ?4,
            bill_id = ?5,
            updated_at = ?6,
            version = version + 1
        WHERE id = ?7 AND version = ?8
        "#,
    )
    .bind(order.status)
    .bind(order.billing_status)
    .bind(order.payment_method)
    .bind(order.payment_time)
    .bind(&order.bill_id)
    .bind(order.updated_at)
    .bind(&order.id)
    .bind(order.version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "FoodOrder", &order.id)?;
    order.version += 1;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

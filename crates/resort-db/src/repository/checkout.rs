//! # Checkout Repository
//!
//! Reconciles a stay into a bill and checks the guest out, all in one
//! transaction.
//!
//! ## Reconcile Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. booking (must be checked_in) + rooms                              │
//! │   2. voucher lookup                     ── missing ──► VoucherNotFound │
//! │   3. unbilled food / services per room, filtered by stay_start         │
//! │   4. compute_breakdown                  ── expired ──► VoucherExpired  │
//! │   5. validate_payments                  ── mismatch ─► InvalidPayment  │
//! │   6. INSERT bill                                                        │
//! │   7. food orders, service assignments → billed (bill_id, version++)    │
//! │   8. INSERT bill_payments (unverified)                                 │
//! │   9. booking → checked_out, rooms → needs_cleaning                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure rolls the whole thing back: no bill, nothing billed, the
//! booking still checked in.

use resort_core::checkout::{
    compute_breakdown, select_food_orders, select_services, validate_payments,
};
use resort_core::{
    Bill, BillPayment, BookingStatus, CheckoutRequest, CoreError, FoodOrder, ServiceAssignment,
};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{OpsError, OpsResult};
use crate::repository::booking::{complete_check_out, fetch_booking, fetch_booking_rooms};
use crate::repository::catalog::fetch_voucher;
use crate::repository::{ensure_updated, food_order, service, RepoContext};
use crate::retry::with_retry;

const SELECT_BILL: &str = r#"
    SELECT id, booking_id, nights, room_charges_cents, food_charges_cents,
           service_charges_cents, gross_total_cents, voucher_code, discount_cents,
           net_total_cents, stay_start, created_at
    FROM bills
"#;

const SELECT_PAYMENT: &str = r#"
    SELECT id, bill_id, method, amount_cents, reference, verified, verified_at, created_at
    FROM bill_payments
"#;

/// Repository for reconciliation and bills.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    ctx: RepoContext,
}

impl CheckoutRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        CheckoutRepository { ctx }
    }

    /// Bills every unbilled charge of the stay and checks the guest out.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown booking
    /// - `InvalidTransition` unless the booking is `checked_in`
    /// - `VoucherNotFound` / `VoucherExpired` for a bad voucher code
    /// - `InvalidPaymentAmount` if supplied payments don't settle the bill
    /// - `ConcurrentModification` if contention outlasts the retry budget
    pub async fn reconcile(&self, request: &CheckoutRequest) -> OpsResult<Bill> {
        with_retry(&self.ctx.engine, "checkout.reconcile", move || {
            self.try_reconcile(request)
        })
        .await
    }

    async fn try_reconcile(&self, request: &CheckoutRequest) -> OpsResult<Bill> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut booking = fetch_booking(&mut tx, &request.booking_id).await?;
        if booking.status != BookingStatus::CheckedIn {
            return Err(CoreError::invalid_transition(
                "Booking",
                &booking.id,
                booking.status,
                BookingStatus::CheckedOut,
            )
            .into());
        }
        let rooms = fetch_booking_rooms(&mut tx, &booking).await?;

        let voucher = match request.voucher_code.as_deref() {
            Some(code) => Some(fetch_voucher(&mut tx, code).await?),
            None => None,
        };

        let stay_start = booking.stay_start();
        let mut food: Vec<FoodOrder> = Vec::new();
        let mut services: Vec<ServiceAssignment> = Vec::new();
        for room in &rooms {
            food.extend(food_order::fetch_unbilled_for_room(&mut tx, &room.id).await?);
            services.extend(service::fetch_unbilled_for_room(&mut tx, &room.id).await?);
        }

        let (breakdown, food_ids, service_ids) = {
            let selected_food = select_food_orders(&food, stay_start);
            let selected_services = select_services(&services, stay_start);
            let breakdown = compute_breakdown(
                &booking,
                &rooms,
                &selected_food,
                &selected_services,
                voucher.as_ref(),
                now,
            )?;
            let food_ids: Vec<String> = selected_food.iter().map(|o| o.id.clone()).collect();
            let service_ids: Vec<String> =
                selected_services.iter().map(|s| s.id.clone()).collect();
            (breakdown, food_ids, service_ids)
        };
        validate_payments(&request.payments, breakdown.net_total)?;

        food.retain(|o| food_ids.contains(&o.id));
        services.retain(|s| service_ids.contains(&s.id));

        debug!(
            booking_id = %booking.id,
            stay_start = %stay_start,
            food_orders = food_ids.len(),
            services = service_ids.len(),
            "Charges selected"
        );

        let mut bill = Bill {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            nights: breakdown.nights,
            room_charges_cents: breakdown.room_charges.cents(),
            food_charges_cents: breakdown.food_charges.cents(),
            service_charges_cents: breakdown.service_charges.cents(),
            gross_total_cents: breakdown.gross_total.cents(),
            voucher_code: voucher.as_ref().map(|v| v.code.clone()),
            discount_cents: breakdown.discount.cents(),
            net_total_cents: breakdown.net_total.cents(),
            stay_start,
            created_at: now,
            food_order_ids: food_ids,
            service_assignment_ids: service_ids,
            payments: Vec::new(),
        };
        insert_bill(&mut tx, &bill).await?;

        for order in &mut food {
            order.mark_billed(Some(&bill.id), now)?;
            food_order::save_order(&mut tx, order).await?;
        }
        for assignment in &mut services {
            assignment.mark_billed(Some(&bill.id), now)?;
            service::save_assignment(&mut tx, assignment).await?;
        }

        for input in &request.payments {
            let payment = BillPayment {
                id: Uuid::new_v4().to_string(),
                bill_id: bill.id.clone(),
                method: input.method,
                amount_cents: input.amount_cents,
                reference: input.reference.clone(),
                verified: false,
                verified_at: None,
                created_at: now,
            };
            insert_payment(&mut tx, &payment).await?;
            bill.payments.push(payment);
        }

        complete_check_out(&mut tx, &mut booking, now).await?;

        tx.commit().await?;

        info!(
            bill_id = %bill.id,
            booking_id = %bill.booking_id,
            gross_cents = bill.gross_total_cents,
            discount_cents = bill.discount_cents,
            net_cents = bill.net_total_cents,
            "Checkout reconciled"
        );

        Ok(bill)
    }

    /// Marks a recorded payment as verified. Verifying twice is a no-op.
    pub async fn verify_payment(&self, payment_id: &str) -> OpsResult<BillPayment> {
        with_retry(&self.ctx.engine, "checkout.verify_payment", move || {
            self.try_verify_payment(payment_id)
        })
        .await
    }

    async fn try_verify_payment(&self, payment_id: &str) -> OpsResult<BillPayment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut payment = fetch_payment(&mut tx, payment_id).await?;
        if payment.verified {
            debug!(payment_id = %payment_id, "Payment already verified");
            return Ok(payment);
        }

        let result = sqlx::query(
            "UPDATE bill_payments SET verified = 1, verified_at = ?1 WHERE id = ?2 AND verified = 0",
        )
        .bind(now)
        .bind(payment_id)
        .execute(&mut *tx)
        .await?;
        ensure_updated(result, "BillPayment", payment_id)?;

        tx.commit().await?;

        payment.verified = true;
        payment.verified_at = Some(now);
        info!(payment_id = %payment_id, bill_id = %payment.bill_id, "Payment verified");
        Ok(payment)
    }

    /// Loads a bill with its included charge ids and payments.
    pub async fn get_bill(&self, bill_id: &str) -> OpsResult<Bill> {
        let mut conn = self.ctx.pool.acquire().await?;
        let sql = format!("{SELECT_BILL} WHERE id = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(bill_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| OpsError::not_found("Bill", bill_id))?;
        load_bill_children(&mut conn, bill).await
    }

    pub async fn get_bill_for_booking(&self, booking_id: &str) -> OpsResult<Bill> {
        let mut conn = self.ctx.pool.acquire().await?;
        let sql = format!("{SELECT_BILL} WHERE booking_id = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(booking_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| OpsError::not_found("Bill", booking_id))?;
        load_bill_children(&mut conn, bill).await
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn insert_bill(conn: &mut SqliteConnection, bill: &Bill) -> OpsResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bills (
            id, booking_id, nights, room_charges_cents, food_charges_cents,
            service_charges_cents, gross_total_cents, voucher_code, discount_cents,
            net_total_cents, stay_start, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&bill.id)
    .bind(&bill.booking_id)
    .bind(bill.nights)
    .bind(bill.room_charges_cents)
    .bind(bill.food_charges_cents)
    .bind(bill.service_charges_cents)
    .bind(bill.gross_total_cents)
    .bind(&bill.voucher_code)
    .bind(bill.discount_cents)
    .bind(bill.net_total_cents)
    .bind(bill.stay_start)
    .bind(bill.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_payment(conn: &mut SqliteConnection, payment: &BillPayment) -> OpsResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bill_payments (
            id, bill_id, method, amount_cents, reference, verified, verified_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.bill_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(&payment.reference)
    .bind(payment.verified)
    .bind(payment.verified_at)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_payment(conn: &mut SqliteConnection, id: &str) -> OpsResult<BillPayment> {
    let sql = format!("{SELECT_PAYMENT} WHERE id = ?1");
    sqlx::query_as::<_, BillPayment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| OpsError::not_found("BillPayment", id))
}

async fn load_bill_children(conn: &mut SqliteConnection, mut bill: Bill) -> OpsResult<Bill> {
    bill.food_order_ids =
        sqlx::query_scalar("SELECT id FROM food_orders WHERE bill_id = ?1 ORDER BY created_at, id")
            .bind(&bill.id)
            .fetch_all(&mut *conn)
            .await?;

    bill.service_assignment_ids = sqlx::query_scalar(
        "SELECT id FROM service_assignments WHERE bill_id = ?1 ORDER BY assigned_at, id",
    )
    .bind(&bill.id)
    .fetch_all(&mut *conn)
    .await?;

    let sql = format!("{SELECT_PAYMENT} WHERE bill_id = ?1 ORDER BY created_at, id");
    bill.payments = sqlx::query_as::<_, BillPayment>(&sql)
        .bind(&bill.id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(bill)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{day, fixture, guest, window, Fixture};
    use chrono::Duration;
    use resort_core::{
        BillingStatus, Booking, Clock, OrderLineInput, PaymentMethod, RoomStatus, ServiceStatus,
    };

    /// Books room 101 for two nights and checks in at midnight on day 0.
    async fn checked_in(fx: &Fixture) -> Booking {
        let bookings = fx.db.bookings();
        let booking = bookings
            .create_booking(&guest(), window(2), &[fx.room_101.id.clone()])
            .await
            .unwrap();
        bookings.check_in(&booking.id, None).await.unwrap()
    }

    async fn order_thali(fx: &Fixture) -> FoodOrder {
        fx.db
            .food_orders()
            .create(
                &fx.room_101.id,
                &fx.chef.id,
                &[OrderLineInput {
                    food_item_id: fx.thali.id.clone(),
                    quantity: 1,
                }],
            )
            .await
            .unwrap()
    }

    async fn completed_spa(fx: &Fixture) -> ServiceAssignment {
        let services = fx.db.services();
        let sa = services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();
        services.transition(&sa.id, ServiceStatus::InProgress).await.unwrap();
        services.transition(&sa.id, ServiceStatus::Completed).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_stay_scenario() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;

        fx.clock.set(day(1));
        let order = order_thali(&fx).await;
        let sa = completed_spa(&fx).await;

        fx.clock.set(day(2));
        let bill = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new(&booking.id))
            .await
            .unwrap();

        // 2 nights × 4000.00 + thali 200.00 + GST 10.00 + spa 150.00
        assert_eq!(bill.nights, 2);
        assert_eq!(bill.room_charges_cents, 800_000);
        assert_eq!(bill.food_charges_cents, 21_000);
        assert_eq!(bill.service_charges_cents, 15_000);
        assert_eq!(bill.gross_total_cents, 836_000);
        assert_eq!(bill.discount_cents, 0);
        assert_eq!(bill.net_total_cents, 836_000);
        assert_eq!(bill.food_order_ids, vec![order.id.clone()]);
        assert_eq!(bill.service_assignment_ids, vec![sa.id.clone()]);

        let order = fx.db.food_orders().get(&order.id).await.unwrap();
        assert_eq!(order.billing_status, BillingStatus::Billed);
        assert_eq!(order.bill_id.as_deref(), Some(bill.id.as_str()));

        let sa = fx.db.services().get(&sa.id).await.unwrap();
        assert_eq!(sa.billing_status, BillingStatus::Billed);

        let booking = fx.db.bookings().get(&booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedOut);
        assert_eq!(booking.checked_out_at, Some(day(2)));

        let room = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::NeedsCleaning);

        let stored = fx.db.checkout().get_bill_for_booking(&booking.id).await.unwrap();
        assert_eq!(stored.id, bill.id);
        assert_eq!(stored.net_total_cents, 836_000);
        assert_eq!(stored.food_order_ids, bill.food_order_ids);
        assert_eq!(stored.service_assignment_ids, bill.service_assignment_ids);
    }

    #[tokio::test]
    async fn test_charges_before_check_in_are_excluded() {
        let fx = fixture().await;
        let bookings = fx.db.bookings();
        let booking = bookings
            .create_booking(&guest(), window(2), &[fx.room_101.id.clone()])
            .await
            .unwrap();

        // previous guest's order, placed at noon on day 0
        let early = order_thali(&fx).await;

        bookings
            .check_in(&booking.id, Some(day(0) + Duration::hours(2)))
            .await
            .unwrap();

        fx.clock.set(day(1));
        let late = order_thali(&fx).await;

        let bill = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new(&booking.id))
            .await
            .unwrap();

        assert_eq!(bill.food_order_ids, vec![late.id.clone()]);
        assert_eq!(bill.food_charges_cents, 21_000);
        assert_eq!(bill.stay_start, day(0) + Duration::hours(2));

        let early = fx.db.food_orders().get(&early.id).await.unwrap();
        assert_eq!(early.billing_status, BillingStatus::Unbilled);
    }

    #[tokio::test]
    async fn test_already_billed_and_unfinished_items_are_skipped() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;

        fx.clock.set(day(1));
        let billed = order_thali(&fx).await;
        fx.db
            .food_orders()
            .mark_billed(&[billed.id.clone()])
            .await
            .unwrap();
        let cancelled = order_thali(&fx).await;
        fx.db.food_orders().cancel(&cancelled.id).await.unwrap();

        let pending = fx
            .db
            .services()
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();

        let bill = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new(&booking.id))
            .await
            .unwrap();

        assert!(bill.food_order_ids.is_empty());
        assert!(bill.service_assignment_ids.is_empty());
        assert_eq!(bill.gross_total_cents, 800_000);

        let pending = fx.db.services().get(&pending.id).await.unwrap();
        assert_eq!(pending.billing_status, BillingStatus::Unbilled);
    }

    #[tokio::test]
    async fn test_voucher_discount() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;
        fx.clock.set(day(1));
        order_thali(&fx).await;

        let bill = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new(&booking.id).with_voucher("STAY10"))
            .await
            .unwrap();

        assert_eq!(bill.gross_total_cents, 821_000);
        assert_eq!(bill.discount_cents, 82_100);
        assert_eq!(bill.net_total_cents, 738_900);
        assert_eq!(bill.voucher_code.as_deref(), Some("STAY10"));
    }

    #[tokio::test]
    async fn test_bad_voucher_rolls_back() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;
        fx.clock.set(day(1));
        let order = order_thali(&fx).await;
        let checkout = fx.db.checkout();

        let err = checkout
            .reconcile(&CheckoutRequest::new(&booking.id).with_voucher("MONSOON5"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VoucherExpired);
        assert_eq!(err.entity_id(), Some("MONSOON5"));

        let err = checkout
            .reconcile(&CheckoutRequest::new(&booking.id).with_voucher("NOSUCH"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VoucherNotFound);

        let order = fx.db.food_orders().get(&order.id).await.unwrap();
        assert_eq!(order.billing_status, BillingStatus::Unbilled);
        let booking = fx.db.bookings().get(&booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedIn);
        assert!(checkout.get_bill_for_booking(&booking.id).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_after_bill_insert_rolls_back_everything() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;
        fx.clock.set(day(1));
        let order = order_thali(&fx).await;
        let sa = completed_spa(&fx).await;

        // the room release is the last write of the reconcile transaction
        sqlx::query(
            r#"
            CREATE TRIGGER reject_room_release
            BEFORE UPDATE OF status ON rooms
            WHEN NEW.status = 'needs_cleaning'
            BEGIN
                SELECT RAISE(ABORT, 'room release rejected');
            END
            "#,
        )
        .execute(fx.db.pool())
        .await
        .unwrap();

        let checkout = fx.db.checkout();
        let request = CheckoutRequest::new(&booking.id).with_payment(PaymentMethod::Card, 836_000);
        let err = checkout.reconcile(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let bills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(fx.db.pool())
            .await
            .unwrap();
        assert_eq!(bills, 0);
        let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_payments")
            .fetch_one(fx.db.pool())
            .await
            .unwrap();
        assert_eq!(payments, 0);

        let stored_order = fx.db.food_orders().get(&order.id).await.unwrap();
        assert_eq!(stored_order.billing_status, BillingStatus::Unbilled);
        assert_eq!(stored_order.bill_id, None);
        assert_eq!(stored_order.version, order.version);

        let stored_sa = fx.db.services().get(&sa.id).await.unwrap();
        assert_eq!(stored_sa.billing_status, BillingStatus::Unbilled);
        assert_eq!(stored_sa.bill_id, None);

        let stored = fx.db.bookings().get(&booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::CheckedIn);
        assert_eq!(stored.checked_out_at, None);
        assert_eq!(stored.version, booking.version);

        let room = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Occupied);

        sqlx::query("DROP TRIGGER reject_room_release")
            .execute(fx.db.pool())
            .await
            .unwrap();
        let bill = checkout.reconcile(&request).await.unwrap();
        assert_eq!(bill.food_order_ids, vec![order.id]);
        assert_eq!(bill.service_assignment_ids, vec![sa.id]);
    }

    #[tokio::test]
    async fn test_reconcile_requires_checked_in_booking() {
        let fx = fixture().await;
        let booking = fx
            .db
            .bookings()
            .create_booking(&guest(), window(1), &[fx.room_101.id.clone()])
            .await
            .unwrap();

        let err = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new(&booking.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = fx
            .db
            .checkout()
            .reconcile(&CheckoutRequest::new("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_second_reconcile_is_rejected() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;
        let checkout = fx.db.checkout();

        checkout.reconcile(&CheckoutRequest::new(&booking.id)).await.unwrap();
        let err = checkout
            .reconcile(&CheckoutRequest::new(&booking.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = fx.db.bookings().check_out(&booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_payments_must_settle_bill() {
        let fx = fixture().await;
        let booking = checked_in(&fx).await;
        let checkout = fx.db.checkout();

        let err = checkout
            .reconcile(
                &CheckoutRequest::new(&booking.id)
                    .with_payment(PaymentMethod::Card, 500_000)
                    .with_payment(PaymentMethod::Cash, 1),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPaymentAmount);

        let bill = checkout
            .reconcile(
                &CheckoutRequest::new(&booking.id)
                    .with_payment(PaymentMethod::Card, 500_000)
                    .with_payment(PaymentMethod::Upi, 300_000),
            )
            .await
            .unwrap();
        assert_eq!(bill.payments.len(), 2);
        assert!(bill.payments.iter().all(|p| !p.verified));

        let payment_id = bill.payments[0].id.clone();
        let verified = checkout.verify_payment(&payment_id).await.unwrap();
        assert!(verified.verified);
        assert_eq!(verified.verified_at, Some(fx.clock.now()));

        let again = checkout.verify_payment(&payment_id).await.unwrap();
        assert_eq!(again.verified_at, verified.verified_at);

        let stored = checkout.get_bill(&bill.id).await.unwrap();
        assert_eq!(stored.payments.iter().filter(|p| p.verified).count(), 1);
    }
}

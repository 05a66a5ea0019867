//! # Booking Repository
//!
//! The occupancy controller: bookings, their room links, and every room
//! status change.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. create_booking(guest, window, rooms)                               │
//! │     └── every room available → booked, links written   (all or none)   │
//! │                                                                         │
//! │  2. check_in(booking, at?)                                             │
//! │     └── booking booked → checked_in, rooms booked → occupied           │
//! │     └── checked_in_at = at ?? check-in date @ 00:00 UTC                │
//! │                                                                         │
//! │  3. check_out(booking)  or  CheckoutRepository::reconcile(request)     │
//! │     └── bill written, charges billed                                   │
//! │     └── booking → checked_out, rooms occupied → needs_cleaning         │
//! │     └── all in one transaction                                         │
//! │                                                                         │
//! │  4. mark_room_cleaned(room)                                            │
//! │     └── needs_cleaning → available                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use resort_core::{Booking, CheckoutRequest, CoreError, GuestInfo, Room, RoomStatus, StayWindow};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{OpsError, OpsResult};
use crate::repository::catalog::fetch_room;
use crate::repository::checkout::CheckoutRepository;
use crate::repository::{ensure_updated, RepoContext};
use crate::retry::with_retry;

/// Repository for bookings and room occupancy.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    ctx: RepoContext,
}

impl BookingRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        BookingRepository { ctx }
    }

    /// Reserves every requested room for a new booking.
    ///
    /// ## Errors
    /// - `Validation` for bad guest details, an inverted window or no rooms
    /// - `NotFound` for an unknown room
    /// - `RoomUnavailable` if any room is not `available`; nothing is written
    pub async fn create_booking(
        &self,
        guest: &GuestInfo,
        window: StayWindow,
        room_ids: &[String],
    ) -> OpsResult<Booking> {
        with_retry(&self.ctx.engine, "booking.create", move || {
            self.try_create_booking(guest, window, room_ids)
        })
        .await
    }

    async fn try_create_booking(
        &self,
        guest: &GuestInfo,
        window: StayWindow,
        room_ids: &[String],
    ) -> OpsResult<Booking> {
        let now = self.ctx.clock.now();
        let booking = Booking::new(guest, window, room_ids, now)?;

        debug!(booking_id = %booking.id, rooms = booking.room_ids.len(), "Creating booking");

        let mut tx = self.ctx.pool.begin().await?;

        let mut rooms = Vec::with_capacity(booking.room_ids.len());
        for room_id in &booking.room_ids {
            let mut room = fetch_room(&mut tx, room_id).await?;
            room.reserve(now)?;
            rooms.push(room);
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, guest_name, guest_mobile, guest_email,
                check_in_date, check_out_date, checked_in_at, checked_out_at,
                status, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.guest_name)
        .bind(&booking.guest_mobile)
        .bind(&booking.guest_email)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(booking.checked_in_at)
        .bind(booking.checked_out_at)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.version)
        .execute(&mut *tx)
        .await?;

        for room in &mut rooms {
            sqlx::query("INSERT INTO booking_rooms (booking_id, room_id) VALUES (?1, ?2)")
                .bind(&booking.id)
                .bind(&room.id)
                .execute(&mut *tx)
                .await?;
            save_room(&mut tx, room).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            guest = %booking.guest_name,
            check_in = %booking.check_in_date,
            check_out = %booking.check_out_date,
            "Booking created"
        );

        Ok(booking)
    }

    /// Starts the stay. Without `at`, midnight of the check-in date is
    /// recorded as the stay boundary.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown booking
    /// - `InvalidTransition` unless the booking is `booked` and every room
    ///   is `booked`
    pub async fn check_in(
        &self,
        booking_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> OpsResult<Booking> {
        with_retry(&self.ctx.engine, "booking.check_in", move || {
            self.try_check_in(booking_id, at)
        })
        .await
    }

    async fn try_check_in(
        &self,
        booking_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> OpsResult<Booking> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut booking = fetch_booking(&mut tx, booking_id).await?;
        booking.check_in(at, now)?;
        save_booking(&mut tx, &mut booking).await?;

        for room_id in &booking.room_ids {
            let mut room = fetch_room(&mut tx, room_id).await?;
            room.transition(RoomStatus::Occupied, now)?;
            save_room(&mut tx, &mut room).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            checked_in_at = ?booking.checked_in_at,
            "Guest checked in"
        );

        Ok(booking)
    }

    /// Checks the guest out by reconciling the stay without a voucher or
    /// payments.
    ///
    /// Rooms only move to `needs_cleaning` once every unbilled charge of the
    /// stay is on the bill, and both happen in the same transaction. Use
    /// [`CheckoutRepository::reconcile`] directly to apply a voucher or
    /// record payments.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown booking
    /// - `InvalidTransition` unless the booking is `checked_in`
    pub async fn check_out(&self, booking_id: &str) -> OpsResult<Booking> {
        let bill = CheckoutRepository::new(self.ctx.clone())
            .reconcile(&CheckoutRequest::new(booking_id))
            .await?;

        debug!(booking_id = %booking_id, bill_id = %bill.id, "Checked out via reconcile");
        self.get(booking_id).await
    }

    /// Housekeeping: `needs_cleaning → available`.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown room
    /// - `InvalidTransition` from any other status
    pub async fn mark_room_cleaned(&self, room_id: &str) -> OpsResult<Room> {
        with_retry(&self.ctx.engine, "room.mark_cleaned", move || {
            self.try_mark_room_cleaned(room_id)
        })
        .await
    }

    async fn try_mark_room_cleaned(&self, room_id: &str) -> OpsResult<Room> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut room = fetch_room(&mut tx, room_id).await?;
        if room.status != RoomStatus::NeedsCleaning {
            return Err(
                CoreError::invalid_transition("Room", room_id, room.status, RoomStatus::Available)
                    .into(),
            );
        }
        room.transition(RoomStatus::Available, now)?;
        save_room(&mut tx, &mut room).await?;

        tx.commit().await?;

        info!(room_id = %room.id, room_number = %room.room_number, "Room cleaned");
        Ok(room)
    }

    /// Gets a booking with its room ids.
    pub async fn get(&self, booking_id: &str) -> OpsResult<Booking> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_booking(&mut conn, booking_id).await
    }

    /// The rooms linked to a booking.
    pub async fn rooms(&self, booking_id: &str) -> OpsResult<Vec<Room>> {
        let mut conn = self.ctx.pool.acquire().await?;
        let booking = fetch_booking(&mut conn, booking_id).await?;
        fetch_booking_rooms(&mut conn, &booking).await
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_booking(conn: &mut SqliteConnection, id: &str) -> OpsResult<Booking> {
    let mut booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, guest_name, guest_mobile, guest_email,
               check_in_date, check_out_date, checked_in_at, checked_out_at,
               status, created_at, updated_at, version
        FROM bookings
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("Booking", id))?;

    booking.room_ids = sqlx::query_scalar(
        "SELECT room_id FROM booking_rooms WHERE booking_id = ?1 ORDER BY room_id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(booking)
}

pub(crate) async fn fetch_booking_rooms(
    conn: &mut SqliteConnection,
    booking: &Booking,
) -> OpsResult<Vec<Room>> {
    let mut rooms = Vec::with_capacity(booking.room_ids.len());
    for room_id in &booking.room_ids {
        rooms.push(fetch_room(conn, room_id).await?);
    }
    Ok(rooms)
}

/// Writes a room's status, guarded by its version.
pub(crate) async fn save_room(conn: &mut SqliteConnection, room: &mut Room) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE rooms SET
            status = ?1,
            updated_at = ?2,
            version = version + 1
        WHERE id = ?3 AND version = ?4
        "#,
    )
    .bind(room.status)
    .bind(room.updated_at)
    .bind(&room.id)
    .bind(room.version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "Room", &room.id)?;
    room.version += 1;
    Ok(())
}

/// Writes a booking's status fields, guarded by its version.
pub(crate) async fn save_booking(
    conn: &mut SqliteConnection,
    booking: &mut Booking,
) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE bookings SET
            status = ?1,
            checked_in_at = ?2,
            checked_out_at = ?3,
            updated_at = ?4,
            version = version + 1
        WHERE id = ?5 AND version = ?6
        "#,
    )
    .bind(booking.status)
    .bind(booking.checked_in_at)
    .bind(booking.checked_out_at)
    .bind(booking.updated_at)
    .bind(&booking.id)
    .bind(booking.version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "Booking", &booking.id)?;
    booking.version += 1;
    Ok(())
}

/// `checked_in → checked_out`, rooms `occupied → needs_cleaning`. Runs in
/// the caller's transaction after the bill is written.
pub(crate) async fn complete_check_out(
    conn: &mut SqliteConnection,
    booking: &mut Booking,
    now: DateTime<Utc>,
) -> OpsResult<Vec<Room>> {
    booking.check_out(now)?;
    save_booking(conn, booking).await?;

    let mut rooms = fetch_booking_rooms(conn, booking).await?;
    for room in &mut rooms {
        room.transition(RoomStatus::NeedsCleaning, now)?;
        save_room(conn, room).await?;
    }

    info!(booking_id = %booking.id, rooms = rooms.len(), "Guest checked out");
    Ok(rooms)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{day, fixture, guest, window};
    use chrono::{NaiveDate, TimeZone};
    use resort_core::{BillingStatus, BookingStatus, OrderLineInput};

    #[tokio::test]
    async fn test_create_booking_reserves_rooms() {
        let fx = fixture().await;
        let ids = vec![fx.room_101.id.clone(), fx.room_102.id.clone()];

        let booking = fx
            .db
            .bookings()
            .create_booking(&guest(), window(2), &ids)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Booked);
        let stored = fx.db.bookings().get(&booking.id).await.unwrap();
        assert_eq!(stored.room_ids.len(), 2);

        for room in fx.db.bookings().rooms(&booking.id).await.unwrap() {
            assert_eq!(room.status, RoomStatus::Booked);
            assert_eq!(room.version, 1);
        }
    }

    #[tokio::test]
    async fn test_create_booking_is_all_or_nothing() {
        let fx = fixture().await;
        let bookings = fx.db.bookings();

        bookings
            .create_booking(&guest(), window(1), &[fx.room_102.id.clone()])
            .await
            .unwrap();

        let err = bookings
            .create_booking(
                &guest(),
                window(1),
                &[fx.room_101.id.clone(), fx.room_102.id.clone()],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoomUnavailable);
        assert_eq!(err.entity_id(), Some(fx.room_102.id.as_str()));

        // no partial reservation survives the failure
        let room = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(fx.db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_create_booking_unknown_room() {
        let fx = fixture().await;
        let err = fx
            .db
            .bookings()
            .create_booking(&guest(), window(1), &["missing".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_check_in_defaults_to_midnight() {
        let fx = fixture().await;
        let bookings = fx.db.bookings();
        let booking = bookings
            .create_booking(&guest(), window(2), &[fx.room_101.id.clone()])
            .await
            .unwrap();

        let booking = bookings.check_in(&booking.id, None).await.unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedIn);
        assert_eq!(
            booking.checked_in_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(booking.check_in_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        let room = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Occupied);

        let err = bookings.check_in(&booking.id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_check_out_bills_stay_and_frees_rooms() {
        let fx = fixture().await;
        let bookings = fx.db.bookings();
        let booking = bookings
            .create_booking(&guest(), window(1), &[fx.room_101.id.clone()])
            .await
            .unwrap();

        let err = bookings.check_out(&booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        bookings.check_in(&booking.id, None).await.unwrap();
        fx.clock.set(day(1));
        let order = fx
            .db
            .food_orders()
            .create(
                &fx.room_101.id,
                &fx.chef.id,
                &[OrderLineInput {
                    food_item_id: fx.lassi.id.clone(),
                    quantity: 2,
                }],
            )
            .await
            .unwrap();

        let booking = bookings.check_out(&booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedOut);
        assert_eq!(booking.checked_out_at, Some(day(1)));

        let room = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::NeedsCleaning);

        // one night at 4000.00 plus two lassis with 5% GST
        let bill = fx.db.checkout().get_bill_for_booking(&booking.id).await.unwrap();
        assert_eq!(bill.gross_total_cents, 400_000 + 18_900);
        assert_eq!(bill.food_order_ids, vec![order.id.clone()]);
        let order = fx.db.food_orders().get(&order.id).await.unwrap();
        assert_eq!(order.billing_status, BillingStatus::Billed);

        let err = bookings.check_out(&booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_mark_room_cleaned_only_from_needs_cleaning() {
        let fx = fixture().await;
        let bookings = fx.db.bookings();

        let err = bookings.mark_room_cleaned(&fx.room_101.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        sqlx::query("UPDATE rooms SET status = 'needs_cleaning' WHERE id = ?1")
            .bind(&fx.room_101.id)
            .execute(fx.db.pool())
            .await
            .unwrap();

        let room = bookings.mark_room_cleaned(&fx.room_101.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_stale_room_version_is_concurrent_modification() {
        let fx = fixture().await;
        let mut stale = fx.db.catalog().get_room(&fx.room_101.id).await.unwrap();

        fx.db
            .bookings()
            .create_booking(&guest(), window(1), &[fx.room_101.id.clone()])
            .await
            .unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        stale.status = RoomStatus::Booked;
        let err = save_room(&mut conn, &mut stale).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.entity_id(), Some(fx.room_101.id.as_str()));
    }
}

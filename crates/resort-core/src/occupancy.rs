//! # Booking / Room Occupancy Controller
//!
//! Room status is driven entirely by booking events and housekeeping.
//!
//! ## Room Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   available ──create_booking──► booked ──check_in──► occupied          │
//! │       ▲                                                   │             │
//! │       │                                              check_out          │
//! │       │                                                   ▼             │
//! │       └────────────mark_cleaned───────────────── needs_cleaning        │
//! │                                                                         │
//! │   Booking:  booked ──check_in──► checked_in ──check_out──► checked_out │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stay Boundary
//! Charges belong to a stay if they were created at or after
//! [`Booking::stay_start`]: the precise `checked_in_at` when recorded,
//! otherwise midnight (UTC) of the check-in date. Older bookings imported
//! without a timestamp rely on that fallback.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_email, validate_guest_name, validate_mobile};

// =============================================================================
// Room
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Available,
    Booked,
    Occupied,
    NeedsCleaning,
}

impl RoomStatus {
    pub const fn can_transition_to(self, next: RoomStatus) -> bool {
        use RoomStatus::*;
        matches!(
            (self, next),
            (Available, Booked)
                | (Booked, Occupied)
                | (Occupied, NeedsCleaning)
                | (NeedsCleaning, Available)
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Booked => "booked",
            RoomStatus::Occupied => "occupied",
            RoomStatus::NeedsCleaning => "needs_cleaning",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    pub id: String,
    /// Business key shown to staff ("101").
    pub room_number: String,
    pub room_type: String,
    pub price_per_night_cents: i64,
    pub status: RoomStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Room {
    #[inline]
    pub fn nightly_rate(&self) -> Money {
        Money::from_cents(self.price_per_night_cents)
    }

    /// `available → booked`.
    ///
    /// ## Errors
    /// - `RoomUnavailable` from any other status
    pub fn reserve(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != RoomStatus::Available {
            return Err(CoreError::RoomUnavailable {
                room_id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        self.status = RoomStatus::Booked;
        self.updated_at = now;
        Ok(())
    }

    /// Moves along any other edge of the room cycle.
    ///
    /// ## Errors
    /// - `InvalidTransition` if `status → next` is not an allowed edge
    pub fn transition(&mut self, next: RoomStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::invalid_transition("Room", &self.id, self.status, next));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Booking
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Booked,
    CheckedIn,
    CheckedOut,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Booked => "booked",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
        })
    }
}

/// Who is staying.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuestInfo {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
}

impl GuestInfo {
    pub fn validate(&self) -> CoreResult<()> {
        validate_guest_name(&self.name)?;
        validate_mobile(&self.mobile)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Check-in and check-out dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StayWindow {
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
}

impl StayWindow {
    /// ## Errors
    /// - `Validation` unless `check_out` is after `check_in`
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> CoreResult<Self> {
        if check_out <= check_in {
            return Err(ValidationError::InvalidFormat {
                field: "check_out_date".to_string(),
                reason: "must be after check_in_date".to_string(),
            }
            .into());
        }
        Ok(StayWindow {
            check_in,
            check_out,
        })
    }

    /// Billable nights; a same-day stay still bills one night.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }
}

/// A reservation of one or more rooms.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub guest_name: String,
    pub guest_mobile: String,
    pub guest_email: Option<String>,
    #[ts(as = "String")]
    pub check_in_date: NaiveDate,
    #[ts(as = "String")]
    pub check_out_date: NaiveDate,
    /// Precise start of occupancy.
    #[ts(as = "Option<String>")]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub checked_out_at: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub version: i64,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub room_ids: Vec<String>,
}

impl Booking {
    /// Builds a validated booking in `booked` status. Room availability is
    /// checked separately, per room, with [`Room::reserve`].
    ///
    /// ## Errors
    /// - `Validation` for bad guest details or an empty room set
    pub fn new(
        guest: &GuestInfo,
        window: StayWindow,
        room_ids: &[String],
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        guest.validate()?;
        if room_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "room_ids".to_string(),
            }
            .into());
        }

        let mut room_ids = room_ids.to_vec();
        room_ids.sort();
        room_ids.dedup();

        Ok(Booking {
            id: Uuid::new_v4().to_string(),
            guest_name: guest.name.trim().to_string(),
            guest_mobile: guest.mobile.trim().to_string(),
            guest_email: guest.email.as_deref().map(str::trim).map(str::to_string),
            check_in_date: window.check_in,
            check_out_date: window.check_out,
            checked_in_at: None,
            checked_out_at: None,
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
            version: 0,
            room_ids,
        })
    }

    pub fn window(&self) -> StayWindow {
        StayWindow {
            check_in: self.check_in_date,
            check_out: self.check_out_date,
        }
    }

    /// Midnight UTC of the check-in date.
    pub fn check_in_midnight(&self) -> DateTime<Utc> {
        self.check_in_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Lower bound for charges belonging to this stay. No upper bound.
    pub fn stay_start(&self) -> DateTime<Utc> {
        self.checked_in_at.unwrap_or_else(|| self.check_in_midnight())
    }

    /// `booked → checked_in`. Without an explicit timestamp the check-in
    /// date's midnight is recorded.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless currently `booked`
    pub fn check_in(&mut self, at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != BookingStatus::Booked {
            return Err(CoreError::invalid_transition(
                "Booking",
                &self.id,
                self.status,
                BookingStatus::CheckedIn,
            ));
        }
        self.checked_in_at = Some(at.unwrap_or_else(|| self.check_in_midnight()));
        self.status = BookingStatus::CheckedIn;
        self.updated_at = now;
        Ok(())
    }

    /// `checked_in → checked_out`. The caller guarantees reconciliation.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless currently `checked_in`
    pub fn check_out(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != BookingStatus::CheckedIn {
            return Err(CoreError::invalid_transition(
                "Booking",
                &self.id,
                self.status,
                BookingStatus::CheckedOut,
            ));
        }
        self.checked_out_at = Some(now);
        self.status = BookingStatus::CheckedOut;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn guest() -> GuestInfo {
        GuestInfo {
            name: "Asha Rao".to_string(),
            mobile: "+91 98450 12345".to_string(),
            email: Some("asha@example.com".to_string()),
        }
    }

    fn room() -> Room {
        Room {
            id: "room-101".to_string(),
            room_number: "101".to_string(),
            room_type: "deluxe".to_string(),
            price_per_night_cents: 400_000,
            status: RoomStatus::Available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    fn booking() -> Booking {
        let window = StayWindow::new(date(1), date(3)).unwrap();
        Booking::new(&guest(), window, &["room-101".to_string()], Utc::now()).unwrap()
    }

    #[test]
    fn test_room_cycle() {
        let mut r = room();
        let now = Utc::now();
        r.reserve(now).unwrap();
        r.transition(RoomStatus::Occupied, now).unwrap();
        r.transition(RoomStatus::NeedsCleaning, now).unwrap();
        r.transition(RoomStatus::Available, now).unwrap();
        assert_eq!(r.status, RoomStatus::Available);
    }

    #[test]
    fn test_reserve_non_available_room() {
        let mut r = room();
        r.status = RoomStatus::NeedsCleaning;
        let err = r.reserve(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RoomUnavailable { ref status, .. } if status == "needs_cleaning"
        ));
        assert_eq!(r.status, RoomStatus::NeedsCleaning);
    }

    #[test]
    fn test_room_cannot_skip_cleaning() {
        let mut r = room();
        r.status = RoomStatus::Occupied;
        assert!(r.transition(RoomStatus::Available, Utc::now()).is_err());
    }

    #[test]
    fn test_stay_window() {
        assert!(StayWindow::new(date(3), date(3)).is_err());
        assert!(StayWindow::new(date(3), date(1)).is_err());
        assert_eq!(StayWindow::new(date(1), date(4)).unwrap().nights(), 3);
    }

    #[test]
    fn test_booking_requires_rooms_and_dedups() {
        let window = StayWindow::new(date(1), date(2)).unwrap();
        assert!(Booking::new(&guest(), window, &[], Utc::now()).is_err());

        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let b = Booking::new(&guest(), window, &ids, Utc::now()).unwrap();
        assert_eq!(b.room_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_check_in_defaults_to_midnight() {
        let mut b = booking();
        assert_eq!(b.stay_start(), Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());

        b.check_in(None, Utc::now()).unwrap();
        assert_eq!(
            b.checked_in_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_check_in_with_timestamp_moves_boundary() {
        let mut b = booking();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 14, 30, 0).unwrap();
        b.check_in(Some(at), at).unwrap();
        assert_eq!(b.stay_start(), at);
        assert!(b.stay_start() > at - Duration::minutes(1));
    }

    #[test]
    fn test_booking_status_progression() {
        let mut b = booking();
        assert!(b.check_out(Utc::now()).is_err());
        b.check_in(None, Utc::now()).unwrap();
        assert!(b.check_in(None, Utc::now()).is_err());
        b.check_out(Utc::now()).unwrap();
        assert_eq!(b.status, BookingStatus::CheckedOut);
        assert!(b.checked_out_at.is_some());
    }
}

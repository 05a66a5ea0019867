//! # resort-core: Pure Business Logic for Resort Operations
//!
//! State machines, charge arithmetic and validation for a resort's rooms,
//! bookings, services, inventory and restaurant. Nothing in this crate
//! touches a database, a clock it wasn't handed, or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Resort Operations Engine                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ resort-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐     │   │
//! │  │   │ occupancy │ │  service  │ │ inventory │ │   food    │     │   │
//! │  │   │ Room      │ │ Service-  │ │ Inventory-│ │ FoodOrder │     │   │
//! │  │   │ Booking   │ │ Assignment│ │ Assignment│ │ + lines   │     │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘     │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐     │   │
//! │  │   │ checkout  │ │   money   │ │validation │ │ clock /   │     │   │
//! │  │   │ Bill      │ │ Money     │ │  rules    │ │ config    │     │   │
//! │  │   │ Voucher   │ │ Rate      │ │           │ │           │     │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  resort-db (Transactional Layer)                │   │
//! │  │     SQLite, migrations, repositories, optimistic versioning     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: time comes in as an argument, ids are the only
//!    randomness
//! 2. **Integer Money**: every amount is minor units in an `i64`
//! 3. **Explicit Errors**: every failure is a [`CoreError`] variant
//!
//! ## Example Usage
//!
//! ```rust
//! use resort_core::money::Money;
//! use resort_core::types::Rate;
//!
//! let food = Money::from_cents(20_010);        // 200.10
//! let gst = food.percentage(Rate::from_bps(500));
//! assert_eq!(gst.cents(), 1_001);              // 10.005 rounds half-up
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod clock;
pub mod config;
pub mod error;
pub mod food;
pub mod inventory;
pub mod money;
pub mod occupancy;
pub mod service;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{Bill, BillBreakdown, BillPayment, CheckoutRequest, PaymentInput, Voucher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use food::{FoodOrder, FoodOrderLine, FoodOrderStatus, OrderLineInput};
pub use inventory::{InventoryAssignment, InventoryStatus};
pub use money::Money;
pub use occupancy::{Booking, BookingStatus, GuestInfo, Room, RoomStatus, StayWindow};
pub use service::{ServiceAssignment, ServiceStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST applied to food orders when nothing else is configured (5%).
pub const DEFAULT_GST_BPS: u32 = 500;

/// Attempts a contended write gets before the conflict is surfaced.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Maximum quantity on a single food line.
///
/// Catches typos like 1000 for 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum lines on one food order.
pub const MAX_ORDER_LINES: usize = 50;

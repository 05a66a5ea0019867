//! # resort-db: Ledger Store for the Resort Engine
//!
//! SQLite persistence for the resort operations engine, using sqlx for async
//! access. Every engine operation is a repository method that runs as one
//! transaction, with `resort-core` deciding what is allowed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resort Engine Data Flow                          │
//! │                                                                         │
//! │  Caller (front desk, kitchen, housekeeping)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resort-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookingRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ServiceRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Clock         │    │ InventoryRepo │    │              │  │   │
//! │  │   │ EngineConfig  │    │ FoodOrderRepo │    │              │  │   │
//! │  │   │               │    │ CheckoutRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ retry.rs (ConcurrentModification)│
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store errors, operation errors, caller-facing reports
//! - [`repository`] - One repository per engine component
//! - [`retry`] - Bounded retry of contended operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resort_core::{CheckoutRequest, EngineConfig};
//! use resort_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("resort.db"))
//!     .await?
//!     .with_engine_config(EngineConfig::from_env());
//!
//! let bill = db
//!     .checkout()
//!     .reconcile(&CheckoutRequest::new(&booking_id).with_voucher("WELCOME10"))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod retry;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind, ErrorReport, OpsError, OpsResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::checkout::CheckoutRepository;
pub use repository::food_order::FoodOrderRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::service::ServiceRepository;

// =============================================================================
// Test Fixtures
// =============================================================================

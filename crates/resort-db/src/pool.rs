//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite, and the
//! [`Database`] handle that hands out repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  DbConfig::new(path)                 ← pool settings                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await         ← pool + migrations               │
//! │       │                                                                 │
//! │       ├── .with_clock(Arc<dyn Clock>)          (default SystemClock)   │
//! │       └── .with_engine_config(EngineConfig)    (default 5% GST, 3 tries)│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.bookings() / db.services() / db.inventory() / db.food_orders()     │
//! │  db.checkout() / db.catalog()                                          │
//! │       │                                                                 │
//! │       ▼  each call = one transaction on one pooled connection          │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so front desk reads
//! don't queue behind kitchen writes. Writers still serialize; a writer that
//! loses the race sees `SQLITE_BUSY`, which surfaces as a retryable
//! `ConcurrentModification`.

use resort_core::{Clock, EngineConfig, SystemClock};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::booking::BookingRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::checkout::CheckoutRepository;
use crate::repository::food_order::FoodOrderRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::service::ServiceRepository;
use crate::repository::RepoContext;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/resort/resort.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits on a locked database before `SQLITE_BUSY`.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// A single connection: every `:memory:` connection is its own database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; every repository it returns shares the same pool, clock
/// and engine configuration.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./resort.db"))
///     .await?
///     .with_engine_config(EngineConfig::from_env());
///
/// let booking = db.bookings().create_booking(&guest, window, &room_ids).await?;
/// db.bookings().check_in(&booking.id, None).await?;
/// let bill = db.checkout().reconcile(&CheckoutRequest::new(&booking.id)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    clock: Arc<dyn Clock>,

    engine: EngineConfig,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    ///    - Busy timeout before `SQLITE_BUSY`
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            clock: Arc::new(SystemClock),
            engine: EngineConfig::default(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Replaces the time source used by every repository.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the GST rate and retry policy used by every repository.
    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        info!(
            gst_bps = engine.gst_rate.bps(),
            max_attempts = engine.max_attempts,
            "Engine configuration applied"
        );
        self.engine = engine;
        self
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    fn context(&self) -> RepoContext {
        RepoContext {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
            engine: self.engine.clone(),
        }
    }

    /// Rooms, employees, services, menu, stock and vouchers.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.context())
    }

    /// Booking / room occupancy controller.
    pub fn bookings(&self) -> BookingRepository {
        BookingRepository::new(self.context())
    }

    /// Service assignment state machine.
    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(self.context())
    }

    /// Inventory balance tracker.
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.context())
    }

    /// Food order billing state machine.
    pub fn food_orders(&self) -> FoodOrderRepository {
        FoodOrderRepository::new(self.context())
    }

    /// Checkout reconciliation aggregator.
    pub fn checkout(&self) -> CheckoutRepository {
        CheckoutRepository::new(self.context())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is responsive.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use resort_core::Rate;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_engine_config_reaches_repositories() {
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_engine_config(EngineConfig::default().with_gst_rate(Rate::from_bps(1200)));

        assert_eq!(db.engine_config().gst_rate.bps(), 1200);
        assert_eq!(db.context().engine.gst_rate.bps(), 1200);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }
}

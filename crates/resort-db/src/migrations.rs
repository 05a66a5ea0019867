//! # Database Migrations
//!
//! Embedded SQL migrations for the resort ledger.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table                                          │
//! │       │                                                                 │
//! │       ├── Table doesn't exist? Create it                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql   catalog, bookings, charges, bills   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each in _sqlx_migrations      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_room_notes.sql`)
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
///
/// The `sqlx::migrate!()` macro embeds every SQL file at compile time, so
/// the binary needs no migration files at runtime.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent, and each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_inventory_invariant_is_enforced_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO employees (id, name, role, created_at) VALUES ('e-1', 'Ravi', 'housekeeping', '2026-03-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO inventory_items (id, name, unit, quantity_on_hand, created_at, updated_at) VALUES ('i-1', 'Towel', 'piece', 10, '2026-03-01T00:00:00Z', '2026-03-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let insert = |id: &'static str, used: i64, returned: i64| {
            sqlx::query(
                r#"
                INSERT INTO inventory_assignments (
                    id, employee_id, item_id, quantity_assigned, quantity_used,
                    quantity_returned, assigned_at, updated_at
                ) VALUES (
                    ?1, 'e-1', 'i-1', 2, ?2, ?3,
                    '2026-03-01T00:00:00Z', '2026-03-01T00:00:00Z'
                )
                "#,
            )
            .bind(id)
            .bind(used)
            .bind(returned)
        };

        assert!(insert("ia-1", 1, 1).execute(db.pool()).await.is_ok());
        assert!(insert("ia-2", 2, 1).execute(db.pool()).await.is_err());
    }
}

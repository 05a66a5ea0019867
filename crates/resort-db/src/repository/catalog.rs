//! # Catalog Repository
//!
//! Reference data the engine prices and validates against: rooms,
//! employees, services, menu items, inventory stock, vouchers.
//!
//! ## Price Lookup
//! Live prices live here. Orders and completed service assignments copy the
//! price inside their own transaction, so [`update_food_price`] and
//! [`update_service_charge`] never reach existing charges.
//!
//! [`update_food_price`]: CatalogRepository::update_food_price
//! [`update_service_charge`]: CatalogRepository::update_service_charge

use chrono::{DateTime, Utc};
use resort_core::validation::{
    validate_name, validate_price_cents, validate_rate_bps, validate_stock_level,
    validate_voucher_code,
};
use resort_core::{
    CoreError, Employee, FoodItem, InventoryItem, Money, Rate, Room, RoomStatus, Service, Voucher,
};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{OpsError, OpsResult};
use crate::repository::RepoContext;

/// Repository for catalog records.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    ctx: RepoContext,
}

impl CatalogRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        CatalogRepository { ctx }
    }

    // -------------------------------------------------------------------------
    // Rooms
    // -------------------------------------------------------------------------

    /// Adds a room in `available` status.
    pub async fn create_room(
        &self,
        room_number: &str,
        room_type: &str,
        price_per_night: Money,
    ) -> OpsResult<Room> {
        validate_name("room_number", room_number)?;
        validate_name("room_type", room_type)?;
        validate_price_cents(price_per_night.cents())?;

        let now = self.ctx.clock.now();
        let room = Room {
            id: Uuid::new_v4().to_string(),
            room_number: room_number.trim().to_string(),
            room_type: room_type.trim().to_string(),
            price_per_night_cents: price_per_night.cents(),
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        debug!(id = %room.id, room_number = %room.room_number, "Creating room");

        sqlx::query(
            r#"
            INSERT INTO rooms (
                id, room_number, room_type, price_per_night_cents,
                status, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&room.id)
        .bind(&room.room_number)
        .bind(&room.room_type)
        .bind(room.price_per_night_cents)
        .bind(room.status)
        .bind(room.created_at)
        .bind(room.updated_at)
        .bind(room.version)
        .execute(&self.ctx.pool)
        .await?;

        Ok(room)
    }

    pub async fn get_room(&self, id: &str) -> OpsResult<Room> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_room(&mut conn, id).await
    }

    pub async fn list_rooms(&self) -> OpsResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, room_number, room_type, price_per_night_cents,
                   status, created_at, updated_at, version
            FROM rooms
            ORDER BY room_number
            "#,
        )
        .fetch_all(&self.ctx.pool)
        .await?;

        Ok(rooms)
    }

    // -------------------------------------------------------------------------
    // Employees
    // -------------------------------------------------------------------------

    pub async fn create_employee(&self, name: &str, role: &str) -> OpsResult<Employee> {
        validate_name("employee_name", name)?;
        validate_name("role", role)?;

        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            is_active: true,
            created_at: self.ctx.clock.now(),
        };

        sqlx::query(
            "INSERT INTO employees (id, name, role, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.role)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .execute(&self.ctx.pool)
        .await?;

        Ok(employee)
    }

    pub async fn get_employee(&self, id: &str) -> OpsResult<Employee> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_employee(&mut conn, id).await
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    pub async fn create_service(
        &self,
        name: &str,
        description: Option<&str>,
        charge: Money,
    ) -> OpsResult<Service> {
        validate_name("service_name", name)?;
        validate_price_cents(charge.cents())?;

        let now = self.ctx.clock.now();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            charge_cents: charge.cents(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, description, charge_cents, is_active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.charge_cents)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.ctx.pool)
        .await?;

        Ok(service)
    }

    pub async fn get_service(&self, id: &str) -> OpsResult<Service> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_service(&mut conn, id).await
    }

    /// Changes the live charge. Completed assignments keep theirs.
    pub async fn update_service_charge(&self, id: &str, charge: Money) -> OpsResult<Service> {
        validate_price_cents(charge.cents())?;

        let result = sqlx::query("UPDATE services SET charge_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(charge.cents())
            .bind(self.ctx.clock.now())
            .execute(&self.ctx.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("Service", id));
        }

        info!(service_id = %id, charge_cents = charge.cents(), "Service charge updated");
        self.get_service(id).await
    }

    /// Retires or reinstates a service. Inactive services can't be assigned.
    pub async fn set_service_active(&self, id: &str, active: bool) -> OpsResult<Service> {
        let result = sqlx::query("UPDATE services SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(self.ctx.clock.now())
            .execute(&self.ctx.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("Service", id));
        }

        self.get_service(id).await
    }

    // -------------------------------------------------------------------------
    // Menu
    // -------------------------------------------------------------------------

    pub async fn create_food_item(&self, name: &str, price: Money) -> OpsResult<FoodItem> {
        validate_name("food_item_name", name)?;
        validate_price_cents(price.cents())?;

        let now = self.ctx.clock.now();
        let item = FoodItem {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            price_cents: price.cents(),
            is_available: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO food_items (id, name, price_cents, is_available, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.is_available)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.ctx.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_food_item(&self, id: &str) -> OpsResult<FoodItem> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_food_item(&mut conn, id).await
    }

    /// Changes the live menu price. Existing orders keep theirs.
    pub async fn update_food_price(&self, id: &str, price: Money) -> OpsResult<FoodItem> {
        validate_price_cents(price.cents())?;

        let result = sqlx::query("UPDATE food_items SET price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price.cents())
            .bind(self.ctx.clock.now())
            .execute(&self.ctx.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("FoodItem", id));
        }

        info!(food_item_id = %id, price_cents = price.cents(), "Menu price updated");
        self.get_food_item(id).await
    }

    /// Takes an item off the menu or puts it back.
    pub async fn set_food_item_available(&self, id: &str, available: bool) -> OpsResult<FoodItem> {
        let result =
            sqlx::query("UPDATE food_items SET is_available = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(available)
                .bind(self.ctx.clock.now())
                .execute(&self.ctx.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("FoodItem", id));
        }

        self.get_food_item(id).await
    }

    // -------------------------------------------------------------------------
    // Inventory stock
    // -------------------------------------------------------------------------

    pub async fn create_inventory_item(
        &self,
        name: &str,
        unit: &str,
        quantity_on_hand: i64,
    ) -> OpsResult<InventoryItem> {
        validate_name("inventory_item_name", name)?;
        validate_name("unit", unit)?;
        validate_stock_level(quantity_on_hand)?;

        let now = self.ctx.clock.now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            quantity_on_hand,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, unit, quantity_on_hand, created_at, updated_at, version
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.quantity_on_hand)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.ctx.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_inventory_item(&self, id: &str) -> OpsResult<InventoryItem> {
        let mut conn = self.ctx.pool.acquire().await?;
        let (item, _) = fetch_inventory_item(&mut conn, id).await?;
        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Vouchers
    // -------------------------------------------------------------------------

    pub async fn create_voucher(
        &self,
        code: &str,
        discount: Rate,
        expiry_date: DateTime<Utc>,
    ) -> OpsResult<Voucher> {
        validate_voucher_code(code)?;
        validate_rate_bps("discount", discount.bps())?;

        let voucher = Voucher {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            discount_bps: discount.bps(),
            expiry_date,
            created_at: self.ctx.clock.now(),
        };

        sqlx::query(
            r#"
            INSERT INTO vouchers (id, code, discount_bps, expiry_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&voucher.id)
        .bind(&voucher.code)
        .bind(voucher.discount_bps)
        .bind(voucher.expiry_date)
        .bind(voucher.created_at)
        .execute(&self.ctx.pool)
        .await?;

        Ok(voucher)
    }

    pub async fn get_voucher(&self, code: &str) -> OpsResult<Voucher> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_voucher(&mut conn, code).await
    }
}

// =============================================================================
// Lookups shared with the other repositories
// =============================================================================

pub(crate) async fn fetch_room(conn: &mut SqliteConnection, id: &str) -> OpsResult<Room> {
    sqlx::query_as::<_, Room>(
        r#"
        SELECT id, room_number, room_type, price_per_night_cents,
               status, created_at, updated_at, version
        FROM rooms
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("Room", id))
}

pub(crate) async fn fetch_employee(conn: &mut SqliteConnection, id: &str) -> OpsResult<Employee> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, name, role, is_active, created_at FROM employees WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("Employee", id))
}

pub(crate) async fn fetch_service(conn: &mut SqliteConnection, id: &str) -> OpsResult<Service> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT id, name, description, charge_cents, is_active, created_at, updated_at
        FROM services
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("Service", id))
}

pub(crate) async fn fetch_food_item(conn: &mut SqliteConnection, id: &str) -> OpsResult<FoodItem> {
    sqlx::query_as::<_, FoodItem>(
        r#"
        SELECT id, name, price_cents, is_available, created_at, updated_at
        FROM food_items
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("FoodItem", id))
}

/// Stock row plus its version.
pub(crate) async fn fetch_inventory_item(
    conn: &mut SqliteConnection,
    id: &str,
) -> OpsResult<(InventoryItem, i64)> {
    let item = sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT id, name, unit, quantity_on_hand, created_at, updated_at
        FROM inventory_items
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| OpsError::not_found("InventoryItem", id))?;

    let version: i64 = sqlx::query_scalar("SELECT version FROM inventory_items WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok((item, version))
}

pub(crate) async fn fetch_voucher(conn: &mut SqliteConnection, code: &str) -> OpsResult<Voucher> {
    sqlx::query_as::<_, Voucher>(
        r#"
        SELECT id, code, discount_bps, expiry_date, created_at
        FROM vouchers
        WHERE code = ?1
        "#,
    )
    .bind(code.trim())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        OpsError::Domain(CoreError::VoucherNotFound {
            code: code.to_string(),
        })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

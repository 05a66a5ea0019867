//! # Seed Data Generator
//!
//! Populates a database with a small resort for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./resort_dev.db (default)
//! cargo run -p resort-db --bin seed
//!
//! # Specify database path
//! cargo run -p resort-db --bin seed -- --db ./data/resort.db
//!
//! # Chattier output
//! RUST_LOG=resort_db=debug cargo run -p resort-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Rooms on two floors: standard, deluxe and suite
//! - Front desk, housekeeping, kitchen and spa staff
//! - A room-service menu and a service catalog
//! - Linen and amenity stock
//! - Voucher `WELCOME10` (10%, valid 90 days)

use chrono::{Duration, Utc};
use resort_core::{Money, Rate};
use resort_db::{Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;

/// (number, type, nightly rate in cents)
const ROOMS: &[(&str, &str, i64)] = &[
    ("101", "standard", 350_000),
    ("102", "standard", 350_000),
    ("103", "deluxe", 550_000),
    ("104", "deluxe", 550_000),
    ("201", "deluxe", 600_000),
    ("202", "suite", 950_000),
    ("203", "suite", 950_000),
];

/// (name, role)
const EMPLOYEES: &[(&str, &str)] = &[
    ("Meera Nair", "front_desk"),
    ("Ravi Kumar", "housekeeping"),
    ("Anil Joseph", "housekeeping"),
    ("Farah Sheikh", "kitchen"),
    ("Lakshmi Iyer", "spa"),
];

/// (name, price in cents)
const MENU: &[(&str, i64)] = &[
    ("Veg Thali", 28_000),
    ("Chicken Biryani", 42_000),
    ("Masala Dosa", 18_000),
    ("Paneer Tikka", 32_000),
    ("Sweet Lassi", 9_000),
    ("Filter Coffee", 6_000),
    ("Fresh Lime Soda", 7_500),
];

/// (name, description, charge in cents)
const SERVICES: &[(&str, &str, i64)] = &[
    ("Ayurvedic Massage", "60 minutes", 250_000),
    ("Laundry", "Per bag, same day", 45_000),
    ("Airport Transfer", "One way, sedan", 180_000),
    ("Guided Backwater Tour", "Half day", 320_000),
];

/// (name, unit, stock on hand)
const INVENTORY: &[(&str, &str, i64)] = &[
    ("Bath Towel", "piece", 200),
    ("Bed Sheet", "piece", 150),
    ("Massage Oil", "bottle", 40),
    ("Toiletry Kit", "kit", 300),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resort_db=info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./resort_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Resort Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./resort_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Resort Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let catalog = db.catalog();

    let existing = catalog.list_rooms().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} rooms", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (number, room_type, rate) in ROOMS {
        catalog
            .create_room(number, room_type, Money::from_cents(*rate))
            .await?;
    }
    println!("✓ {} rooms", ROOMS.len());

    for (name, role) in EMPLOYEES {
        catalog.create_employee(name, role).await?;
    }
    println!("✓ {} employees", EMPLOYEES.len());

    for (name, price) in MENU {
        catalog.create_food_item(name, Money::from_cents(*price)).await?;
    }
    println!("✓ {} menu items", MENU.len());

    for (name, description, charge) in SERVICES {
        catalog
            .create_service(name, Some(*description), Money::from_cents(*charge))
            .await?;
    }
    println!("✓ {} services", SERVICES.len());

    for (name, unit, stock) in INVENTORY {
        catalog.create_inventory_item(name, unit, *stock).await?;
    }
    println!("✓ {} inventory items", INVENTORY.len());

    let voucher = catalog
        .create_voucher("WELCOME10", Rate::from_bps(1000), Utc::now() + Duration::days(90))
        .await?;
    println!("✓ Voucher {} (expires {})", voucher.code, voucher.expiry_date.date_naive());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

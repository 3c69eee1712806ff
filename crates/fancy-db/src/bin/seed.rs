//! # Seed Data Generator
//!
//! Populates the database with the store's starter catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./fancy_store.db
//! cargo run -p fancy-db --bin seed
//!
//! # Specify database path
//! cargo run -p fancy-db --bin seed -- --db ./data/fancy_store.db
//! ```
//!
//! ## Seeded Data
//! - Ten accessories across six categories, GST 12% or 18%
//! - The walk-in customer used for counter sales without a phone number

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use fancy_core::{Money, Product, TaxRate};
use fancy_db::{generate_product_id, Database, DbConfig};

/// Minimum stock before a product shows on the low-stock list.
const MIN_STOCK_LEVEL: i64 = 10;

/// (code, name, category, price in rupees, GST %, stock)
const CATALOG: &[(&str, &str, &str, i64, f64, i64)] = &[
    ("ER001", "Crystal Drop Earrings", "Earrings", 299, 12.0, 50),
    ("ER002", "Golden Hoop Earrings", "Earrings", 399, 12.0, 30),
    ("BG001", "Designer Bangles Set (6pcs)", "Bangles", 599, 12.0, 25),
    ("BG002", "Stone Studded Bangles", "Bangles", 799, 12.0, 20),
    ("HC001", "Butterfly Hair Clip", "Hair Accessories", 149, 18.0, 100),
    ("HC002", "Pearl Hair Band", "Hair Accessories", 199, 18.0, 75),
    ("BR001", "Charm Bracelet", "Bracelets", 449, 12.0, 40),
    ("BR002", "Beaded Bracelet", "Bracelets", 249, 12.0, 60),
    ("CL001", "Mini Hair Clips (12pcs)", "Clips", 99, 18.0, 150),
    ("NK001", "Pendant Necklace", "Necklaces", 899, 12.0, 15),
];

const WALK_IN_NAME: &str = "Walk-in Customer";
const WALK_IN_PHONE: &str = "0000000000";
const WALK_IN_EMAIL: &str = "walkin@store.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./fancy_store.db");

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
                println!("Fancy Store Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fancy_store.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fancy Store Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Adding catalog...");

    let mut added = 0;
    for &(code, name, category, rupees, gst, stock) in CATALOG {
        let product = sample_product(code, name, category, rupees, gst, stock);

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", code, e);
            continue;
        }

        println!("  {:<6} {:<30} {:>10}  GST {}", code, name, product.price, product.gst_rate);
        added += 1;
    }

    db.customers()
        .find_or_create(WALK_IN_NAME, WALK_IN_PHONE, Some(WALK_IN_EMAIL))
        .await?;

    println!();
    println!("✓ Added {} products", added);
    println!("✓ Walk-in customer ready");

    let low = db.products().low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn sample_product(
    code: &str,
    name: &str,
    category: &str,
    rupees: i64,
    gst: f64,
    stock: i64,
) -> Product {
    let now = Utc::now();

    Product {
        id: generate_product_id(),
        product_code: code.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price: Money::from_rupees(rupees),
        gst_rate: TaxRate::from_percentage(gst),
        stock_quantity: stock,
        min_stock_level: MIN_STOCK_LEVEL,
        description: None,
        created_at: now,
        updated_at: now,
    }
}

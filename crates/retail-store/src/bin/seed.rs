//! # Seed Data Loader
//!
//! Creates (or opens) a store file and loads the demo accounts, products
//! and clients.
//!
//! ## Usage
//! ```bash
//! # Seed keys that are not set yet (store at RETAIL_DB_PATH or the data dir)
//! cargo run -p retail-store --bin seed
//!
//! # Wipe everything and seed again
//! cargo run -p retail-store --bin seed -- --reset
//!
//! # Specify database path
//! cargo run -p retail-store --bin seed -- --db ./data/retailos.db
//! ```

use std::env;

use retail_store::{init_tracing, Store, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut reset = false;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--reset" | "-r" => reset = true,
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RetailOS Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -r, --reset        Clear every key before seeding");
                println!("  -d, --db <PATH>    Database file path (default: $RETAIL_DB_PATH or data dir)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => StoreConfig::new(path),
        None => StoreConfig::from_env()?,
    };

    println!("RetailOS Seed Data Loader");
    println!("=========================");
    println!("Database: {}", config.database_path.display());
    println!();

    let store = Store::open(config).await?;
    println!("✓ Connected to store");
    println!("✓ Migrations applied");

    if reset {
        store.reset().await?;
        println!("✓ Store cleared and re-seeded");
    } else {
        store.init().await?;
        println!("✓ Missing keys seeded");
    }

    let users = store.users().list_users().await?;
    let products = store.catalog().list_products().await?;
    let clients = store.clients().list_clients().await?;
    let sales = store.ledger().get_all_sales().await?;
    let inventory = store.catalog().inventory_summary().await?;

    println!();
    println!("  Users:    {}", users.len());
    println!(
        "  Products: {} ({} units, {} low on stock)",
        products.len(),
        inventory.total_units,
        inventory.low_stock_count
    );
    println!("  Clients:  {}", clients.len());
    println!("  Sales:    {}", sales.len());
    match store.register().get_register().await? {
        Some(register) => println!("  Register: open since {}", register.opened_at),
        None => println!("  Register: closed"),
    }

    store.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

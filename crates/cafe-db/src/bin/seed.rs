//! # Seed Data Generator
//!
//! Populates a database with a demo coffee menu for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (engine.toml / CAFE_DB_PATH)
//! cargo run -p cafe-db --bin seed
//!
//! # Seed a specific file and ring up a few demo sales
//! cargo run -p cafe-db --bin seed -- --db ./cafe_dev.db --sales 20
//! ```
//!
//! ## Generated Data
//! - Ingredients with opening stock (milk, beans, syrups, cups)
//! - Made-to-order drinks with recipes
//! - Externally sourced items (bottled drinks, pastries) with no recipe
//! - Optional demo sales, committed through the real checkout pipeline

use std::env;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cafe_core::{Money, PaymentRequest, Quantity};
use cafe_db::{Database, Engine, EngineConfig};

/// (name, unit, opening stock in units, low-stock threshold in units)
const INGREDIENTS: &[(&str, &str, i64, i64)] = &[
    ("Whole Milk", "L", 40, 8),
    ("Oat Milk", "L", 12, 3),
    ("Espresso Beans", "g", 5000, 1000),
    ("Vanilla Syrup", "mL", 2000, 300),
    ("Caramel Syrup", "mL", 2000, 300),
    ("Chocolate Sauce", "mL", 1500, 250),
    ("Cup 12oz", "pc", 500, 100),
];

/// (sku, name, category, price in cents, recipe as (ingredient, milli per unit))
const MENU: &[(&str, &str, &str, i64, &[(&str, i64)])] = &[
    (
        "ESP-S",
        "Espresso",
        "Coffee",
        250,
        &[("Espresso Beans", 18_000), ("Cup 12oz", 1_000)],
    ),
    (
        "AMR-12",
        "Americano 12oz",
        "Coffee",
        320,
        &[("Espresso Beans", 18_000), ("Cup 12oz", 1_000)],
    ),
    (
        "LAT-12",
        "Latte 12oz",
        "Coffee",
        450,
        &[("Espresso Beans", 18_000), ("Whole Milk", 240), ("Cup 12oz", 1_000)],
    ),
    (
        "OLAT-12",
        "Oat Latte 12oz",
        "Coffee",
        520,
        &[("Espresso Beans", 18_000), ("Oat Milk", 240), ("Cup 12oz", 1_000)],
    ),
    (
        "VLAT-12",
        "Vanilla Latte 12oz",
        "Coffee",
        510,
        &[
            ("Espresso Beans", 18_000),
            ("Whole Milk", 220),
            ("Vanilla Syrup", 30_000),
            ("Cup 12oz", 1_000),
        ],
    ),
    (
        "CMAC-12",
        "Caramel Macchiato 12oz",
        "Coffee",
        540,
        &[
            ("Espresso Beans", 18_000),
            ("Whole Milk", 220),
            ("Caramel Syrup", 30_000),
            ("Cup 12oz", 1_000),
        ],
    ),
    (
        "MOC-12",
        "Mocha 12oz",
        "Coffee",
        530,
        &[
            ("Espresso Beans", 18_000),
            ("Whole Milk", 200),
            ("Chocolate Sauce", 40_000),
            ("Cup 12oz", 1_000),
        ],
    ),
    ("WTR-500", "Bottled Water", "Drinks", 150, &[]),
    ("OJ-350", "Orange Juice", "Drinks", 300, &[]),
    ("CRS-BTR", "Butter Croissant", "Pastry", 350, &[]),
    ("MUF-BLU", "Blueberry Muffin", "Pastry", 325, &[]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut demo_sales: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    demo_sales = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cafe POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: from engine config)");
                println!("  -s, --sales <N>    Demo sales to ring up after seeding (default: 0)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = EngineConfig::load(None)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }

    let engine = Engine::open(config).await?;
    let db = engine.database();

    let existing = db.menu().list_active().await?;
    if !existing.is_empty() {
        warn!(items = existing.len(), "Menu already seeded; delete the database file to regenerate");
        return Ok(());
    }

    seed_catalog(db).await?;

    if demo_sales > 0 {
        ring_up_demo_sales(&engine, demo_sales).await?;
    }

    let now = Utc::now();
    let summary = db.sales().summarize(now - Duration::days(1), now + Duration::days(1)).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let low = db.ingredients().list_low_stock().await?;
    for ingredient in &low {
        warn!(name = %ingredient.name, on_hand = %ingredient.quantity_on_hand(), "Low stock");
    }

    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let mut ingredient_ids = std::collections::HashMap::new();
    for (name, unit, opening, threshold) in INGREDIENTS {
        let ingredient = db
            .ingredients()
            .insert(name, unit, Quantity::from_units(*opening), Quantity::from_units(*threshold))
            .await?;
        ingredient_ids.insert(*name, ingredient.id);
    }
    info!(count = ingredient_ids.len(), "Ingredients seeded");

    for (sku, name, category, price_cents, recipe) in MENU {
        let item = db.menu().insert(sku, name, category, Money::from_cents(*price_cents)).await?;

        let mut lines = Vec::with_capacity(recipe.len());
        for (ingredient, milli) in recipe.iter() {
            let id = ingredient_ids
                .get(ingredient)
                .ok_or_else(|| format!("recipe for {} names unknown ingredient {}", sku, ingredient))?;
            lines.push((id.clone(), Quantity::from_milli(*milli)));
        }
        db.recipes().set_recipe(&item.id, &lines).await?;
    }
    info!(count = MENU.len(), "Menu seeded");

    Ok(())
}

/// Commits `count` small orders, cycling through the menu and payment types.
async fn ring_up_demo_sales(engine: &Engine, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let items = engine.database().menu().list_active().await?;
    if items.is_empty() {
        return Ok(());
    }

    let mut committed = 0;
    for n in 0..count {
        let mut order = engine.new_order();
        let first = &items[n % items.len()];
        let second = &items[(n * 7 + 3) % items.len()];

        for (item, quantity) in [(first, 1 + (n % 2) as i64), (second, 1)] {
            if let Err(e) = engine.add_line(&mut order, &item.id, quantity).await {
                warn!(item = %item.name, error = %e, "Skipping line");
            }
        }
        if order.is_empty() {
            continue;
        }

        let payment = match n % 3 {
            0 => PaymentRequest::cash(Money::from_cents(order.total().cents() + 500)),
            1 => PaymentRequest::card(),
            _ => PaymentRequest::e_wallet(),
        };
        match engine.checkout(&mut order, "demo-cashier", payment).await {
            Ok(_) => committed += 1,
            Err(e) => warn!(error = %e, "Demo checkout failed"),
        }
    }

    info!(committed, requested = count, "Demo sales rung up");
    Ok(())
}

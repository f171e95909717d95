//! # Seed Data Generator
//!
//! Populates the database with demo sales for development.
//!
//! ## Usage
//! ```bash
//! # Record 50 sales (default) in $STOREHUB_DB_PATH or ./storehub.db
//! cargo run -p storehub-db --bin seed
//!
//! # Record a custom amount
//! cargo run -p storehub-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p storehub-db --bin seed -- --db ./data/storehub.db
//! ```
//!
//! ## Generated Data
//! - Reference rows: cashiers, clients and products (only when empty)
//! - Sales with 1-4 items each, totals computed from the items
//! - Lifecycle walk: most sales are completed, some canceled, some of the
//!   completed ones returned and a few canceled ones reactivated
//!
//! A JSON summary with the per-status counts is printed at the end.

use std::env;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storehub_core::validation::{validate_new_item, validate_new_item_rules, validate_new_sale};
use storehub_core::{
    Money, NewSale, NewSaleItem, SaleItemRepository, SaleRepository, SaleStatus,
};
use storehub_db::{Database, StoreConfig};

const CASHIERS: &[(&str, &str)] = &[
    ("ana", "Ana Lima"),
    ("bruno", "Bruno Costa"),
    ("carla", "Carla Souza"),
];

const CLIENTS: &[(&str, &str)] = &[
    ("Mercado Central", "compras@mercadocentral.example"),
    ("Padaria Sol", "contato@padariasol.example"),
    ("Hotel Avenida", "financeiro@hotelavenida.example"),
    ("Escola Nova", "secretaria@escolanova.example"),
];

/// (name, price in cents)
const PRODUCTS: &[(&str, i64)] = &[
    ("Coffee 500g", 1_890),
    ("Whole Milk 1L", 549),
    ("French Bread", 120),
    ("Cheddar 200g", 1_275),
    ("Orange Juice 1L", 899),
    ("Rice 5kg", 2_490),
    ("Olive Oil 500ml", 3_150),
    ("Chocolate Bar", 650),
];

const PAYMENT_TYPES: &[&str] = &["cash", "card", "credit_card", "debit_card", "transfer"];

/// Tax rates in basis points
const TAX_RATES: &[i64] = &[0, 500, 825];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = StoreConfig::load()?;
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path: PathBuf = config.database_path.clone();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StoreHub Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of sales to record (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: $STOREHUB_DB_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let database = db_path.display().to_string();
    let db_config = StoreConfig {
        database_path: db_path,
        ..config
    }
    .db_config();
    let db = Database::new(db_config).await?;

    let (users, clients, products) = seed_reference_data(&db).await?;
    if users.is_empty() || clients.is_empty() || products.is_empty() {
        return Err("users, clients and products must all have rows before seeding sales".into());
    }
    info!(
        users = users.len(),
        clients = clients.len(),
        products = products.len(),
        "Reference data ready"
    );

    let sales = db.sales();
    let items = db.sale_items();
    let start = std::time::Instant::now();
    let mut recorded = 0usize;

    for n in 0..count {
        // Lines are checked before the sale exists so its total only counts
        // lines that will actually be stored.
        let lines: Vec<NewSaleItem> = build_lines(n, &products)
            .into_iter()
            .filter(|item| match validate_new_item_rules(item) {
                Ok(()) => true,
                Err(errors) => {
                    warn!(n, %errors, "Skipping invalid demo item");
                    false
                }
            })
            .collect();
        if lines.is_empty() {
            continue;
        }

        let total = lines
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.subtotal);
        // Every fifth sale gets a 5% discount
        let discount = if n % 5 == 0 {
            Money::from_cents(total.cents() * 5 / 100)
        } else {
            Money::zero()
        };

        let new_sale = NewSale {
            client_id: (n % 3 != 0).then(|| clients[n % clients.len()]),
            user_id: users[n % users.len()],
            sale_date: Some(Utc::now() - Duration::hours((count - n) as i64)),
            total_amount: total,
            total_discount: discount,
            payment_type: PAYMENT_TYPES[n % PAYMENT_TYPES.len()].to_string(),
            notes: String::new(),
        };
        if let Err(errors) = validate_new_sale(&new_sale) {
            warn!(n, %errors, "Skipping invalid demo sale");
            continue;
        }

        let sale = sales.create(&new_sale).await?;
        for item in lines {
            let item = NewSaleItem {
                sale_id: sale.id,
                ..item
            };
            validate_new_item(&item)?;
            items.create(&item).await?;
        }

        walk_lifecycle(&sales, sale.id, n).await?;
        recorded += 1;
    }

    info!(recorded, elapsed = ?start.elapsed(), "Sales recorded");

    let mut by_status = serde_json::Map::new();
    for status in SaleStatus::ALL {
        let n = sales.get_by_status(status).await?.len();
        by_status.insert(status.as_str().to_string(), json!(n));
    }

    let summary = json!({
        "database": database,
        "recorded": recorded,
        "by_status": by_status,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}

/// Inserts cashiers, clients and products into empty tables and returns the
/// ids of every row.
async fn seed_reference_data(
    db: &Database,
) -> Result<(Vec<i64>, Vec<i64>, Vec<(i64, Money)>), sqlx::Error> {
    let pool = db.pool();

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if existing == 0 {
        for (username, full_name) in CASHIERS {
            sqlx::query("INSERT INTO users (username, full_name) VALUES (?1, ?2)")
                .bind(*username)
                .bind(*full_name)
                .execute(pool)
                .await?;
        }
        for (name, email) in CLIENTS {
            sqlx::query("INSERT INTO clients (name, email) VALUES (?1, ?2)")
                .bind(*name)
                .bind(*email)
                .execute(pool)
                .await?;
        }
        for (name, price) in PRODUCTS {
            sqlx::query("INSERT INTO products (name, price) VALUES (?1, ?2)")
                .bind(*name)
                .bind(*price)
                .execute(pool)
                .await?;
        }
    }

    let users: Vec<i64> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;
    let clients: Vec<i64> = sqlx::query_scalar("SELECT id FROM clients ORDER BY id")
        .fetch_all(pool)
        .await?;
    let products = sqlx::query_as::<_, (i64, i64)>("SELECT id, price FROM products ORDER BY id")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id, price)| (id, Money::from_cents(price)))
        .collect();

    Ok((users, clients, products))
}

/// Priced lines for the `n`th demo sale, not yet attached to a sale.
fn build_lines(n: usize, products: &[(i64, Money)]) -> Vec<NewSaleItem> {
    let line_count = 1 + n % 4;
    (0..line_count)
        .map(|line| {
            let (product_id, price) = products[(n * 3 + line) % products.len()];
            let quantity = 1 + ((n + line) % 3) as i64;
            let rate = TAX_RATES[(n + line) % TAX_RATES.len()];
            let tax = Money::from_cents(price.multiply_quantity(quantity).cents() * rate / 10_000);
            NewSaleItem::priced(0, product_id, quantity, price, Money::zero(), tax)
        })
        .collect()
}

/// Spreads demo sales over every status.
async fn walk_lifecycle<R: SaleRepository>(
    sales: &R,
    id: i64,
    n: usize,
) -> Result<(), storehub_core::StoreError> {
    match n % 10 {
        0 | 1 => {}
        2 => {
            sales.cancel(id).await?;
        }
        3 => {
            sales.complete(id).await?;
            sales.mark_returned(id).await?;
        }
        4 => {
            sales.cancel(id).await?;
            sales.activate(id).await?;
        }
        _ => {
            sales.complete(id).await?;
        }
    }
    Ok(())
}

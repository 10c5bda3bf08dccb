//! # Seed Data Generator
//!
//! Commits demo invoices through a [`Session`], the same path the billing
//! screen uses, and prints the resulting dashboard.
//!
//! ## Usage
//! ```bash
//! # Commit 12 invoices (default) into the configured database
//! cargo run -p tally-store --bin seed
//!
//! # Custom amount and database path
//! cargo run -p tally-store --bin seed -- --count 50 --db ./tally_dev.db
//! ```
//!
//! Every third invoice uses the priced workflow; the rest are rate-computed
//! with a 0%, 10% or 16% tax rate.

use std::env;

use rust_decimal::Decimal;
use tally_core::{DraftField, Invoice, Money, Workflow};
use tally_store::migrations::migration_status;
use tally_store::{Session, SqliteStore, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CLIENTS: &[&str] = &["Ana", "Luis", "Marta", "Jorge", "Sofía"];

const JOBS: &[&str] = &["Mudanza", "Boda", "Consulta", "Reparación", "Pintura", "Jardín"];

const EXPENSES: &[(&str, &str)] = &[
    ("Transporte", "200.50"),
    ("Comida", "99.50"),
    ("Materiales", "145.25"),
    ("Gasolina", "60"),
    ("Herramientas", "35.99"),
    ("Flores", "120"),
];

const TAX_RATES: &[&str] = &["0", "10", "16"];

const MARKUPS: &[u32] = &[90, 120, 150];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = StoreConfig::from_env();
    let mut count: usize = 12;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of invoices to commit (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: TALLY_DB_PATH or data dir)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", config.db_path.display());
    println!("Invoices: {}", count);
    println!();

    config.ensure_db_dir()?;
    let store = SqliteStore::connect(config.db_config()).await?;
    if !store.health_check().await {
        return Err("database is not answering queries".into());
    }

    let (total, applied) = migration_status(store.pool()).await?;
    println!("✓ Migrations applied: {}/{}", applied, total);

    let mut session = Session::open(store.clone(), &config).await?;

    if session.draft().is_open() {
        println!("⚠ Continuing the open draft already in the database.");
    }

    for n in 0..count {
        let invoice = seed_invoice(&mut session, n).await?;
        info!(invoice = %invoice.label(), total = %invoice.total(), "Seeded invoice");
    }

    let summary = session.dashboard().await?;
    println!();
    println!("✓ Ledger has {} invoices", summary.totals.count);
    println!("  Subtotal: {}", summary.totals.subtotal_sum);
    println!("  Tax:      {}", summary.totals.tax_sum);
    println!("  Total:    {}", summary.totals.total_sum);
    println!();
    println!("Per client:");
    for (client, total) in &summary.per_client {
        let client = if client.is_empty() { "(sin cliente)" } else { client.as_str() };
        println!("  {:<16} {}", client, total);
    }

    let ledger_len = session.ledger().await?.len();
    if let Some(last) = ledger_len.checked_sub(1) {
        let artifact = session.export(last, &config.text_exporter()).await?;
        println!();
        println!("Last invoice, as shared:");
        println!("{}", artifact.body());
    }

    store.close().await;

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Fills the draft deterministically from `n` and commits it.
async fn seed_invoice(
    session: &mut Session<SqliteStore>,
    n: usize,
) -> Result<Invoice, Box<dyn std::error::Error>> {
    let workflow = if n % 3 == 2 {
        Workflow::Priced
    } else {
        Workflow::RateComputed
    };

    let expenses: Vec<(&str, &str)> = (0..(1 + n % 3))
        .map(|k| EXPENSES[(n + k) % EXPENSES.len()])
        .collect();

    session
        .set_field(DraftField::InvoiceName, JOBS[n % JOBS.len()])
        .await?;

    // The workflow is picked before any expense so labels match its shape.
    match workflow {
        Workflow::RateComputed => {
            session
                .set_field(DraftField::ClientName, CLIENTS[n % CLIENTS.len()])
                .await?;
            session
                .set_field(DraftField::TaxRate, TAX_RATES[n % TAX_RATES.len()])
                .await?;
        }
        Workflow::Priced => {
            // Markup between 90% and 150%, so some priced invoices show a loss.
            let cost: Money = expenses
                .iter()
                .map(|(_, amount)| Money::parse_or_zero(amount))
                .sum();
            let markup = Decimal::from(MARKUPS[n % MARKUPS.len()]);
            session
                .set_field(DraftField::FinalPrice, &cost.percent(markup).to_fixed(2))
                .await?;
        }
    }

    for (description, amount) in expenses {
        session.add_expense(description, amount).await?;
    }

    Ok(session.commit().await?)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,tally=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

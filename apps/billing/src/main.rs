//! # fancy-billing
//!
//! Command-line entry point for the billing backend.
//!
//! ## Usage
//! ```bash
//! # Store, database and sequence status (default)
//! fancy-billing status
//!
//! # Sales report, dates inclusive (YYYY-MM-DD, both optional)
//! fancy-billing report 2024-03-01 2024-03-31
//!
//! # Number the next checkout will receive
//! fancy-billing preview-number
//! ```
//!
//! Configuration comes from `billing.toml` (or `$FANCY_CONFIG`) and
//! `FANCY_*` environment variables.

use std::env;
use std::process::ExitCode;
use tracing::{error, info};

use fancy_billing::{init_tracing, ApiError, BillingService, StoreConfig};
use fancy_core::DateRange;
use fancy_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(env::args().skip(1).collect()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fancy-billing failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.first().map(String::as_str).unwrap_or("status");

    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }

    let config = StoreConfig::load(None)?;
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    info!(store = %config.store.name, path = %db_path.display(), "Starting billing backend");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let service = BillingService::new(db.clone(), &config)?;

    let result = match command {
        "status" => status(&service, &config).await,
        "report" => {
            let range = DateRange::parse(
                args.get(1).map(String::as_str),
                args.get(2).map(String::as_str),
            )
            .map_err(ApiError::from)?;
            report(&service, range).await
        }
        "preview-number" => {
            println!("{}", service.next_invoice_number().await?);
            Ok(())
        }
        other => {
            print_help();
            Err(ApiError::validation(format!("Unknown command: {other}")))
        }
    };

    db.close().await;
    Ok(result?)
}

async fn status(service: &BillingService, config: &StoreConfig) -> Result<(), ApiError> {
    let summary = service.dashboard().await?;
    let store = service.store();

    println!("{}", store.name);
    println!("{}", store.address);
    println!("GSTIN: {}", store.gstin);
    println!();
    println!("Database:        {}", config.database_path().display());
    println!("Round-off:       {:?}", service.round_off_policy());
    println!("GST slabs:       {}", config.slabs().labels().join(", "));
    println!("Next invoice:    {}", service.next_invoice_number().await?);
    println!();
    println!("Today:           {} ({} invoices)", summary.today_sales, summary.today_invoices);
    println!("This month:      {}", summary.month_sales);
    println!("Products:        {}", summary.total_products);
    println!("Customers:       {}", summary.total_customers);

    if !summary.low_stock.is_empty() {
        println!();
        println!("Low stock:");
        for product in &summary.low_stock {
            println!("  {:<8} {:<32} {}", product.product_code, product.name, product.stock_quantity);
        }
    }

    if !summary.top_products.is_empty() {
        println!();
        println!("Top products:");
        for sales in &summary.top_products {
            println!("  {:<8} {:<32} {:>4} sold  {}", sales.code, sales.name, sales.quantity, sales.revenue);
        }
    }

    Ok(())
}

async fn report(service: &BillingService, range: DateRange) -> Result<(), ApiError> {
    let report = service.sales_report(range).await?;

    let label = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    println!("Sales report {} to {}", label(report.range.start), label(report.range.end));
    println!();

    for invoice in &report.invoices {
        println!(
            "  {:<12} {}  {:<24} {:>4} units {:>12}  {}",
            invoice.invoice_number,
            invoice.created_at.format("%d-%m-%Y %H:%M"),
            invoice.customer_name,
            invoice.unit_count(),
            invoice.totals.grand_total.to_string(),
            invoice.status,
        );
    }

    println!();
    println!("Invoices:  {} ({} voided)", report.total_invoices, report.voided_invoices);
    println!("Sales:     {}", report.total_sales);
    println!("GST:       {}", report.total_gst);

    Ok(())
}

fn print_help() {
    println!("Fancy Store Billing");
    println!();
    println!("Usage: fancy-billing [COMMAND]");
    println!();
    println!("Commands:");
    println!("  status                 Store, sequence and dashboard summary (default)");
    println!("  report [START] [END]   Sales report, dates as YYYY-MM-DD");
    println!("  preview-number         Number the next invoice will receive");
}

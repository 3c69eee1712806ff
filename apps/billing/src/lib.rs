//! # fancy-billing
//!
//! Billing backend for Fancy Store: configuration, checkout orchestration,
//! reports and the API error type the billing page consumes.
//!
//! ## Module Organization
//! ```text
//! fancy_billing/
//! ├── lib.rs          ◄─── You are here (tracing setup, exports)
//! ├── config.rs       ◄─── billing.toml + FANCY_* overrides
//! ├── service.rs      ◄─── BillingService (checkout, reports, dashboard)
//! └── error.rs        ◄─── ApiError { code, message }
//! ```

pub mod config;
pub mod error;
pub mod service;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, StoreConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use service::{BillingService, CartLine, CheckoutRequest, DashboardSummary, FinalizedInvoice};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=fancy_db=trace` - Show trace for the database crate only
/// - Default: INFO, DEBUG for the fancy crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fancy_billing=debug,fancy_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

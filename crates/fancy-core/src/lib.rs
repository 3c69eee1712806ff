//! # fancy-core: Pure Business Logic for Fancy Store Billing
//!
//! This crate is the **heart** of the billing system. It contains the GST
//! calculator and the invoice sequencer as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Fancy Store Billing Architecture                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Billing page (client scripts)                   │   │
//! │  │        Search ──► Cart ──► Checkout ──► Invoice / WhatsApp      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/billing (BillingService)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fancy-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │    gst    │  │ sequence  │  │ validation│  │   │
//! │  │   │   Money   │  │ TaxCalc   │  │ FANCY0042 │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   fancy-db (Database Layer)                     │   │
//! │  │       SQLite, migrations, atomic invoice number assignment      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type in paise with integer arithmetic
//! - [`types`] - Domain types (LineItem, InvoiceTotals, Invoice, Product, ...)
//! - [`gst`] - Tax & totals calculator (CGST + SGST split, round-off)
//! - [`sequence`] - Invoice number sequencer (`FANCY0001`, `FANCY0002`, ...)
//! - [`validation`] - Business rule validation
//! - [`notification`] - WhatsApp message composition
//! - [`report`] - Sales report aggregation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use fancy_core::gst::compute_totals;
//! use fancy_core::sequence::next_identifier;
//! use fancy_core::{LineItemInput, Money, TaxRate};
//!
//! let items = vec![LineItemInput {
//!     product_id: "p-1".to_string(),
//!     name: "Crystal Drop Earrings".to_string(),
//!     code: "ER001".to_string(),
//!     quantity: 2,
//!     unit_price: Money::from_paise(29_900),
//!     tax_rate: TaxRate::from_bps(1200),
//! }];
//!
//! let bill = compute_totals(&items, Money::zero()).unwrap();
//! assert_eq!(bill.totals.subtotal.paise(), 59_800);
//! assert_eq!(bill.totals.total_tax.paise(), 7_176);
//! assert_eq!(bill.totals.cgst.paise(), 3_588);
//! assert_eq!(bill.totals.grand_total.paise(), 66_976);
//!
//! assert_eq!(next_identifier("FANCY", None).unwrap(), "FANCY0001");
//! assert_eq!(next_identifier("FANCY", Some("FANCY0009")).unwrap(), "FANCY0010");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gst;
pub mod money;
pub mod notification;
pub mod report;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, SequenceError, ValidationError};
pub use gst::TaxCalculator;
pub use money::{ExactAmount, Money};
pub use notification::InvoiceNotification;
pub use report::{DateRange, SalesReport};
pub use sequence::InvoiceSequencer;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Invoice prefix used when the deployment does not configure one.
pub const DEFAULT_INVOICE_PREFIX: &str = "FANCY";

/// Minimum digits in the numeric part of an invoice number.
///
/// Wider numbers are never truncated: `FANCY9999` is followed by `FANCY10000`.
pub const INVOICE_NUMBER_WIDTH: usize = 4;

/// Maximum line items on a single invoice.
pub const MAX_INVOICE_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches typos at the counter (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

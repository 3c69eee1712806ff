//! # Domain Types
//!
//! Core domain types used throughout Fancy Store Billing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Invoice      │   │   LineItem      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id     │       │
//! │  │  product_code   │   │  invoice_number │   │  name/code snap │       │
//! │  │  price          │   │  totals (frozen)│   │  quantity       │       │
//! │  │  gst_rate       │   │  status         │   │  line_total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ InvoiceTotals   │   │ RoundOffPolicy  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  subtotal       │   │  NearestPaisa   │       │
//! │  │  1800 = 18%     │   │  cgst + sgst    │   │  NearestRupee   │       │
//! │  └─────────────────┘   │  round_off      │   └─────────────────┘       │
//! │                        │  grand_total    │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (product_code, invoice_number, phone) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. 1800 bps = 18%. The CGST and SGST halves of every
/// standard slab (2.5%, 6%, 9%, 14%) stay integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (config files, seed data).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// The CGST (or SGST) share of this rate.
    #[inline]
    pub const fn half(&self) -> TaxRate {
        TaxRate(self.0 / 2)
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// `18%`, `2.5%`
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}%", self.percentage())
        }
    }
}

// =============================================================================
// GST Slabs
// =============================================================================

/// The set of GST rates a line item may carry.
///
/// Defaults to the five standard slabs: 0%, 5%, 12%, 18%, 28%.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstSlabs {
    rates: Vec<TaxRate>,
}

impl GstSlabs {
    /// Builds a slab set; duplicates are dropped and rates kept sorted.
    pub fn new(mut rates: Vec<TaxRate>) -> Self {
        rates.sort();
        rates.dedup();
        GstSlabs { rates }
    }

    /// Builds a slab set from percentages such as `[0.0, 5.0, 12.0]`.
    pub fn from_percentages(percentages: &[f64]) -> Self {
        Self::new(percentages.iter().map(|p| TaxRate::from_percentage(*p)).collect())
    }

    /// Returns true when `rate` is one of the slabs.
    pub fn contains(&self, rate: TaxRate) -> bool {
        self.rates.binary_search(&rate).is_ok()
    }

    /// The permitted rates, ascending.
    pub fn rates(&self) -> &[TaxRate] {
        &self.rates
    }

    /// The permitted rates as labels, for error messages.
    pub fn labels(&self) -> Vec<String> {
        self.rates.iter().map(|r| r.to_string()).collect()
    }
}

impl Default for GstSlabs {
    fn default() -> Self {
        GstSlabs::new(vec![
            TaxRate::from_bps(0),
            TaxRate::from_bps(500),
            TaxRate::from_bps(1200),
            TaxRate::from_bps(1800),
            TaxRate::from_bps(2800),
        ])
    }
}

// =============================================================================
// Round-Off Policy
// =============================================================================

/// Precision the grand total is rounded to.
///
/// `round_off` always records the adjustment in paise, so
/// `grand_total == subtotal + total_tax - discount + round_off` under both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoundOffPolicy {
    /// Grand total lands on whole paise (2 decimal places).
    #[default]
    NearestPaisa,
    /// Grand total lands on whole rupees, the usual counter practice.
    NearestRupee,
}

impl FromStr for RoundOffPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest_paisa" | "paisa" | "paise" => Ok(RoundOffPolicy::NearestPaisa),
            "nearest_rupee" | "rupee" => Ok(RoundOffPolicy::NearestRupee),
            _ => Err(ValidationError::NotAllowed {
                field: "round_off".to_string(),
                allowed: vec!["nearest_paisa".to_string(), "nearest_rupee".to_string()],
            }),
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// One cart line as submitted for billing, with catalog data already looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemInput {
    /// Catalog product ID (opaque).
    pub product_id: String,
    /// Display name.
    pub name: String,
    /// Display code (e.g. `ER001`).
    pub code: String,
    /// Units sold, at least 1.
    pub quantity: i64,
    /// Price per unit, before tax.
    pub unit_price: Money,
    /// GST rate for this product.
    pub tax_rate: TaxRate,
}

/// A line item attached to an invoice.
///
/// Uses the snapshot pattern: name, code, price and rate are frozen at
/// billing time and never recomputed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Product code at time of sale (frozen).
    pub code: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    /// `quantity × unit_price`, no tax.
    pub line_total: Money,
    /// Line tax rounded to paise. Display only; invoice tax is summed exactly.
    pub tax_amount: Money,
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// The frozen money summary of an invoice.
///
/// ## Invariants
/// - `cgst + sgst == total_tax`
/// - `grand_total == subtotal + total_tax - discount + round_off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    /// Sum of line totals before tax.
    pub subtotal: Money,
    /// Central GST half.
    pub cgst: Money,
    /// State GST half.
    pub sgst: Money,
    pub total_tax: Money,
    pub discount: Money,
    /// Signed rounding adjustment.
    pub round_off: Money,
    pub grand_total: Money,
}

impl InvoiceTotals {
    /// Checks both invariants.
    pub fn is_consistent(&self) -> bool {
        self.cgst + self.sgst == self.total_tax
            && self.subtotal + self.total_tax - self.discount + self.round_off == self.grand_total
    }
}

/// Output of the tax calculator: the priced lines and their totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillComputation {
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The status of an invoice.
///
/// A voided invoice keeps its number; numbers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice has been paid and finalized.
    #[default]
    Paid,
    /// Invoice was cancelled after issue.
    Voided,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Voided => write!(f, "voided"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card on an external terminal.
    Card,
    /// UPI transfer.
    Upi,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string(), "upi".to_string()],
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
            PaymentMethod::Upi => write!(f, "UPI"),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the store catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier shown on invoices (e.g. `ER001`).
    pub product_code: String,

    /// Display name shown to cashier and on the invoice.
    pub name: String,

    /// Category, also the source of auto-generated codes.
    pub category: String,

    /// Price per unit before tax.
    pub price: Money,

    /// GST rate applied to this product.
    pub gst_rate: TaxRate,

    /// Units on hand.
    pub stock_quantity: i64,

    /// Threshold for the low-stock list.
    pub min_stock_level: i64,

    pub description: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True when stock is at or below the minimum level.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    /// Checks whether `quantity` units can be sold from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }

    /// Snapshot of this product as a billing line.
    pub fn to_line_input(&self, quantity: i64) -> LineItemInput {
        LineItemInput {
            product_id: self.id.clone(),
            name: self.name.clone(),
            code: self.product_code.clone(),
            quantity,
            unit_price: self.price,
            tax_rate: self.gst_rate,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer, identified for billing by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Normalized 10-digit phone number (unique).
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized invoice.
///
/// `totals` is the snapshot computed at creation; it is never recomputed
/// from `items`, so historical invoices stay stable when prices change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-readable sequential number (e.g. `FANCY0042`).
    pub invoice_number: String,
    pub customer_id: Option<String>,
    /// Customer name at time of sale (frozen).
    pub customer_name: String,
    /// Customer phone at time of sale (frozen).
    pub customer_phone: String,
    pub totals: InvoiceTotals,
    pub payment_method: PaymentMethod,
    pub status: InvoiceStatus,
    /// User who created the invoice.
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl Invoice {
    /// Number of units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// True unless the invoice was voided.
    pub fn is_active(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

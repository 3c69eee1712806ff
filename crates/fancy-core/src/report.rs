//! # Sales Reports
//!
//! Aggregation over finalized invoices. The database layer selects the
//! invoices for a [`DateRange`]; this module only sums them.
//!
//! Voided invoices are listed but never counted toward sales or GST.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Invoice;

// =============================================================================
// Date Range
// =============================================================================

/// Calendar-day report window. Both ends inclusive, both optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Every invoice ever issued.
    pub fn all() -> Self {
        DateRange::default()
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            start: Some(date),
            end: Some(date),
        }
    }

    /// Parses optional `YYYY-MM-DD` bounds, as sent by the reports page.
    ///
    /// Blank strings are treated as absent.
    ///
    /// ```rust
    /// use fancy_core::report::DateRange;
    ///
    /// let range = DateRange::parse(Some("2024-03-01"), None).unwrap();
    /// assert!(range.start.is_some() && range.end.is_none());
    /// assert!(DateRange::parse(Some("2024-03-10"), Some("2024-03-01")).is_err());
    /// ```
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        let range = DateRange {
            start: parse_date("start_date", start)?,
            end: parse_date("end_date", end)?,
        };

        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(ValidationError::invalid_format(
                    "end_date",
                    "must not be before start_date",
                ));
            }
        }

        Ok(range)
    }

    /// Inclusive lower bound: midnight UTC of `start`.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Exclusive upper bound: midnight UTC of the day after `end`.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end
            .map(|d| (d.and_time(chrono::NaiveTime::MIN) + Duration::days(1)).and_utc())
    }

    /// True when `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower_bound().map_or(true, |lo| at >= lo) && self.upper_bound().map_or(true, |hi| at < hi)
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD")),
    }
}

// =============================================================================
// Sales Report
// =============================================================================

/// Sales summary for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub range: DateRange,
    /// Sum of grand totals of paid invoices.
    pub total_sales: Money,
    /// Sum of CGST + SGST of paid invoices.
    pub total_gst: Money,
    /// Number of paid invoices.
    pub total_invoices: usize,
    pub voided_invoices: usize,
    /// Every invoice in the range, voided ones included.
    pub invoices: Vec<Invoice>,
}

/// Summarizes `invoices`, which the caller has already filtered to `range`.
pub fn summarize(range: DateRange, invoices: Vec<Invoice>) -> SalesReport {
    let active = invoices.iter().filter(|inv| inv.is_active());

    let (total_sales, total_gst, total_invoices) = active.fold(
        (Money::zero(), Money::zero(), 0usize),
        |(sales, gst, count), inv| (sales + inv.totals.grand_total, gst + inv.totals.total_tax, count + 1),
    );

    SalesReport {
        range,
        total_sales,
        total_gst,
        total_invoices,
        voided_invoices: invoices.len() - total_invoices,
        invoices,
    }
}

// =============================================================================
// Top Products
// =============================================================================

/// Units and pre-tax revenue of one product across invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Best sellers by units sold, ties broken by code. Voided invoices are skipped.
pub fn top_products(invoices: &[Invoice], limit: usize) -> Vec<ProductSales> {
    let mut by_product: HashMap<&str, ProductSales> = HashMap::new();

    for item in invoices.iter().filter(|inv| inv.is_active()).flat_map(|inv| &inv.items) {
        let entry = by_product
            .entry(item.product_id.as_str())
            .or_insert_with(|| ProductSales {
                product_id: item.product_id.clone(),
                code: item.code.clone(),
                name: item.name.clone(),
                quantity: 0,
                revenue: Money::zero(),
            });
        entry.quantity += item.quantity;
        entry.revenue += item.line_total;
    }

    let mut ranked: Vec<ProductSales> = by_product.into_values().collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.code.cmp(&b.code)));
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceStatus, InvoiceTotals, LineItem, PaymentMethod, TaxRate};
    use chrono::TimeZone;

    fn item(code: &str, quantity: i64, price: i64) -> LineItem {
        LineItem {
            product_id: format!("id-{code}"),
            name: code.to_string(),
            code: code.to_string(),
            quantity,
            unit_price: Money::from_paise(price),
            tax_rate: TaxRate::from_bps(1200),
            line_total: Money::from_paise(price * quantity),
            tax_amount: Money::zero(),
        }
    }

    fn invoice(number: &str, grand: i64, tax: i64, status: InvoiceStatus, items: Vec<LineItem>) -> Invoice {
        Invoice {
            id: number.to_lowercase(),
            invoice_number: number.to_string(),
            customer_id: None,
            customer_name: "Walk-in Customer".to_string(),
            customer_phone: "0000000000".to_string(),
            totals: InvoiceTotals {
                total_tax: Money::from_paise(tax),
                grand_total: Money::from_paise(grand),
                ..Default::default()
            },
            payment_method: PaymentMethod::Cash,
            status,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            items,
        }
    }

    #[test]
    fn test_summarize_skips_voided() {
        let invoices = vec![
            invoice("FANCY0001", 10_000, 1_000, InvoiceStatus::Paid, vec![]),
            invoice("FANCY0002", 5_000, 500, InvoiceStatus::Voided, vec![]),
            invoice("FANCY0003", 2_500, 250, InvoiceStatus::Paid, vec![]),
        ];

        let report = summarize(DateRange::all(), invoices);
        assert_eq!(report.total_sales.paise(), 12_500);
        assert_eq!(report.total_gst.paise(), 1_250);
        assert_eq!(report.total_invoices, 2);
        assert_eq!(report.voided_invoices, 1);
        assert_eq!(report.invoices.len(), 3);
    }

    #[test]
    fn test_summarize_empty() {
        let report = summarize(DateRange::all(), vec![]);
        assert!(report.total_sales.is_zero());
        assert_eq!(report.total_invoices, 0);
    }

    #[test]
    fn test_date_range_end_is_inclusive() {
        let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-01")).unwrap();

        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_date_range_open_ends() {
        let range = DateRange::parse(Some(""), None).unwrap();
        assert_eq!(range, DateRange::all());
        assert!(range.lower_bound().is_none());
        assert!(range.upper_bound().is_none());
        assert!(range.contains(Utc::now()));
    }

    #[test]
    fn test_date_range_rejects_bad_input() {
        assert!(DateRange::parse(Some("01-03-2024"), None).is_err());
        assert!(DateRange::parse(Some("2024-03-05"), Some("2024-03-04")).is_err());
    }

    #[test]
    fn test_top_products() {
        let invoices = vec![
            invoice(
                "FANCY0001",
                0,
                0,
                InvoiceStatus::Paid,
                vec![item("ER001", 2, 29_900), item("HC001", 1, 14_900)],
            ),
            invoice("FANCY0002", 0, 0, InvoiceStatus::Paid, vec![item("HC001", 3, 14_900)]),
            invoice("FANCY0003", 0, 0, InvoiceStatus::Voided, vec![item("BG001", 9, 59_900)]),
        ];

        let top = top_products(&invoices, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "HC001");
        assert_eq!(top[0].quantity, 4);
        assert_eq!(top[0].revenue.paise(), 59_600);
        assert_eq!(top[1].code, "ER001");

        assert_eq!(top_products(&invoices, 1).len(), 1);
    }
}

//! # Repository Module
//!
//! Database repository implementations for Fancy Store Billing.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BillingService                                                        │
//! │       │                                                                 │
//! │       │  db.invoices().create(&sequencer, &draft)                      │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── create(&self, sequencer, draft)   ← one transaction               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list_in_range(&self, range)                                       │
//! │  └── void(&self, id)                                                   │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, FromRow rows)                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `*Row` structs and converted into the
//! `fancy-core` domain types; SQL column names never leak out of this module.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, stock
//! - [`customer::CustomerRepository`] - Customers keyed by phone
//! - [`invoice::InvoiceRepository`] - Atomic invoice creation and queries

pub mod customer;
pub mod invoice;
pub mod product;

use fancy_core::TaxRate;

use crate::error::{DbError, DbResult};

/// Reads a stored `gst_rate_bps` column back into a [`TaxRate`].
pub(crate) fn tax_rate_from_column(bps: i64) -> DbResult<TaxRate> {
    u32::try_from(bps)
        .ok()
        .filter(|&bps| bps <= 10_000)
        .map(TaxRate::from_bps)
        .ok_or_else(|| DbError::Internal(format!("stored GST rate out of range: {bps} bps")))
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("hoop"), "%hoop%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_tax_rate_from_column() {
        assert_eq!(tax_rate_from_column(1800).unwrap(), TaxRate::from_bps(1800));
        assert_eq!(tax_rate_from_column(0).unwrap(), TaxRate::from_bps(0));
        assert!(matches!(tax_rate_from_column(-1), Err(DbError::Internal(_))));
        assert!(matches!(tax_rate_from_column(10_001), Err(DbError::Internal(_))));
        assert!(matches!(tax_rate_from_column(i64::from(u32::MAX) + 1), Err(DbError::Internal(_))));
    }
}

//! # Invoice Repository
//!
//! Creation, lookup and voiding of invoices.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. UPDATE invoice_sequence SET updated_at   ← takes the write lock    │
//! │   2. SELECT last_identifier                     (other checkouts wait)  │
//! │   3. next_identifier(last)  ──► SequenceError aborts everything         │
//! │   4. UPDATE invoice_sequence SET last_identifier = next                 │
//! │   5. find-or-create customer by phone                                   │
//! │   6. INSERT invoices (UNIQUE invoice_number is the second guard)        │
//! │   7. INSERT invoice_items (frozen snapshot)                             │
//! │   8. UPDATE products SET stock_quantity = stock_quantity - qty          │
//! │      WHERE stock_quantity >= qty          ──► InsufficientStock aborts  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error drops the transaction, which rolls back every step including
//! the sequence update. A failed checkout never consumes a number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::customer::find_or_create_in;
use crate::repository::tax_rate_from_column;
use fancy_core::{
    BillComputation, CoreError, DateRange, Invoice, InvoiceSequencer, InvoiceStatus, InvoiceTotals,
    LineItem, Money, PaymentMethod,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, customer_name, customer_phone, \
     subtotal_paise, cgst_paise, sgst_paise, total_tax_paise, discount_paise, round_off_paise, \
     grand_total_paise, payment_method, status, created_by, created_at";

const ITEM_COLUMNS: &str = "product_id, product_code, product_name, quantity, unit_price_paise, \
     gst_rate_bps, line_total_paise, tax_paise";

// =============================================================================
// Draft
// =============================================================================

/// Everything needed to persist an invoice except its number.
///
/// The number is assigned inside [`InvoiceRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_name: String,
    /// Normalized 10-digit phone.
    pub customer_phone: String,
    pub customer_email: Option<String>,
    /// Output of the tax calculator.
    pub bill: BillComputation,
    pub payment_method: PaymentMethod,
    pub created_by: Option<String>,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_id: Option<String>,
    customer_name: String,
    customer_phone: String,
    subtotal_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    total_tax_paise: i64,
    discount_paise: i64,
    round_off_paise: i64,
    grand_total_paise: i64,
    payment_method: PaymentMethod,
    status: InvoiceStatus,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<LineItem>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            totals: InvoiceTotals {
                subtotal: Money::from_paise(self.subtotal_paise),
                cgst: Money::from_paise(self.cgst_paise),
                sgst: Money::from_paise(self.sgst_paise),
                total_tax: Money::from_paise(self.total_tax_paise),
                discount: Money::from_paise(self.discount_paise),
                round_off: Money::from_paise(self.round_off_paise),
                grand_total: Money::from_paise(self.grand_total_paise),
            },
            payment_method: self.payment_method,
            status: self.status,
            created_by: self.created_by,
            created_at: self.created_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    product_id: String,
    product_code: String,
    product_name: String,
    quantity: i64,
    unit_price_paise: i64,
    gst_rate_bps: i64,
    line_total_paise: i64,
    tax_paise: i64,
}

impl TryFrom<ItemRow> for LineItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(LineItem {
            product_id: row.product_id,
            name: row.product_name,
            code: row.product_code,
            quantity: row.quantity,
            unit_price: Money::from_paise(row.unit_price_paise),
            tax_rate: tax_rate_from_column(row.gst_rate_bps)?,
            line_total: Money::from_paise(row.line_total_paise),
            tax_amount: Money::from_paise(row.tax_paise),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Persists a finalized invoice and assigns its number, atomically.
    ///
    /// See the module docs for the exact transaction. Concurrent callers
    /// are serialized by the SQLite write lock and always receive distinct,
    /// consecutive numbers.
    ///
    /// ## Errors
    /// * `DbError::Sequence` - stored last number is corrupt
    /// * `DbError::Domain(CoreError::InsufficientStock)` - a line exceeds stock
    /// * `DbError::NotFound` - a line references a deleted product
    /// * `DbError::UniqueViolation` - number collision (second guard)
    pub async fn create(&self, sequencer: &InvoiceSequencer, draft: &InvoiceDraft) -> DbResult<Invoice> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now();

        // Write first: the lock is held from here until commit.
        sqlx::query("UPDATE invoice_sequence SET updated_at = ?1 WHERE id = 1")
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT last_identifier FROM invoice_sequence WHERE id = 1")
                .fetch_one(&mut *tx)
                .await?;

        let invoice_number = sequencer.next_identifier(previous.as_deref()).map_err(|e| {
            warn!(previous = ?previous, error = %e, "Cannot continue invoice sequence");
            e
        })?;

        sqlx::query("UPDATE invoice_sequence SET last_identifier = ?1 WHERE id = 1")
            .bind(&invoice_number)
            .execute(&mut *tx)
            .await?;

        let customer = find_or_create_in(
            &mut tx,
            &draft.customer_name,
            &draft.customer_phone,
            draft.customer_email.as_deref(),
        )
        .await?;

        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            customer_id: Some(customer.id),
            customer_name: draft.customer_name.clone(),
            customer_phone: draft.customer_phone.clone(),
            totals: draft.bill.totals,
            payment_method: draft.payment_method,
            status: InvoiceStatus::Paid,
            created_by: draft.created_by.clone(),
            created_at: now,
            items: draft.bill.items.clone(),
        };

        insert_header(&mut tx, &invoice).await?;

        for (line_no, item) in invoice.items.iter().enumerate() {
            insert_item(&mut tx, &invoice.id, line_no as i64 + 1, item).await?;
            take_stock(&mut tx, item, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            invoice_number = %invoice.invoice_number,
            grand_total = %invoice.totals.grand_total,
            lines = invoice.items.len(),
            "Invoice created"
        );

        Ok(invoice)
    }

    /// The last number issued, if any.
    pub async fn last_identifier(&self) -> DbResult<Option<String>> {
        let last: Option<String> =
            sqlx::query_scalar("SELECT last_identifier FROM invoice_sequence WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(last)
    }

    /// Gets an invoice with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");

        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.hydrate_one(row).await
    }

    /// Gets an invoice by its number (e.g. `FANCY0042`).
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = ?1");

        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        self.hydrate_one(row).await
    }

    /// Lines of an invoice in billing order.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<LineItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY line_no");

        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(invoice_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LineItem::try_from).collect()
    }

    /// Lists invoices, newest first.
    pub async fn list(&self, limit: Option<u32>) -> DbResult<Vec<Invoice>> {
        let limit = limit.map_or(-1, i64::from);
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );

        let rows: Vec<InvoiceRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Invoices of one customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE customer_id = ?1 \
             ORDER BY created_at DESC, rowid DESC"
        );

        let rows: Vec<InvoiceRow> = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Invoices created inside `range` (end date inclusive), oldest first.
    pub async fn list_in_range(&self, range: &DateRange) -> DbResult<Vec<Invoice>> {
        debug!(start = ?range.start, end = ?range.end, "Listing invoices in range");

        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE (?1 IS NULL OR created_at >= ?1) \
               AND (?2 IS NULL OR created_at < ?2) \
             ORDER BY created_at, rowid"
        );

        let rows: Vec<InvoiceRow> = sqlx::query_as(&sql)
            .bind(range.lower_bound())
            .bind(range.upper_bound())
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Counts invoices of any status.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Voids a paid invoice and returns its stock to the shelf.
    ///
    /// The number stays issued; the next checkout continues the sequence.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such invoice
    /// * `DbError::Domain(CoreError::InvalidInvoiceStatus)` - already voided
    pub async fn void(&self, id: &str) -> DbResult<Invoice> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("UPDATE invoices SET status = 'voided' WHERE id = ?1 AND status = 'paid'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let current: Option<(String, InvoiceStatus)> =
                sqlx::query_as("SELECT invoice_number, status FROM invoices WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match current {
                None => DbError::not_found("Invoice", id),
                Some((invoice_number, status)) => CoreError::InvalidInvoiceStatus {
                    invoice_number,
                    current_status: status.to_string(),
                }
                .into(),
            });
        }

        // Products deleted since the sale are skipped
        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + (
                    SELECT SUM(quantity) FROM invoice_items
                    WHERE invoice_id = ?1 AND product_id = products.id
                ),
                updated_at = ?2
            WHERE id IN (SELECT product_id FROM invoice_items WHERE invoice_id = ?1)
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let invoice = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        info!(invoice_number = %invoice.invoice_number, "Invoice voided");
        Ok(invoice)
    }

    async fn hydrate_one(&self, row: Option<InvoiceRow>) -> DbResult<Option<Invoice>> {
        match row {
            None => Ok(None),
            Some(row) => {
                let items = self.get_items(&row.id).await?;
                Ok(Some(row.into_invoice(items)))
            }
        }
    }

    async fn hydrate(&self, rows: Vec<InvoiceRow>) -> DbResult<Vec<Invoice>> {
        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.get_items(&row.id).await?;
            invoices.push(row.into_invoice(items));
        }
        Ok(invoices)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

async fn insert_header(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let t = &invoice.totals;

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, customer_name, customer_phone,
            subtotal_paise, cgst_paise, sgst_paise, total_tax_paise,
            discount_paise, round_off_paise, grand_total_paise,
            payment_method, status, created_by, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_phone)
    .bind(t.subtotal.paise())
    .bind(t.cgst.paise())
    .bind(t.sgst.paise())
    .bind(t.total_tax.paise())
    .bind(t.discount.paise())
    .bind(t.round_off.paise())
    .bind(t.grand_total.paise())
    .bind(invoice.payment_method)
    .bind(invoice.status)
    .bind(&invoice.created_by)
    .bind(invoice.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate("invoice_number", &invoice.invoice_number),
        other => other,
    })?;

    Ok(())
}

async fn insert_item(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    line_no: i64,
    item: &LineItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, line_no, product_id, product_code, product_name,
            quantity, unit_price_paise, gst_rate_bps, line_total_paise, tax_paise
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(invoice_id)
    .bind(line_no)
    .bind(&item.product_id)
    .bind(&item.code)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(item.unit_price.paise())
    .bind(item.tax_rate.bps())
    .bind(item.line_total.paise())
    .bind(item.tax_amount.paise())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn take_stock(conn: &mut SqliteConnection, item: &LineItem, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - ?1, updated_at = ?2 \
         WHERE id = ?3 AND stock_quantity >= ?1",
    )
    .bind(item.quantity)
    .bind(now)
    .bind(&item.product_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
        .bind(&item.product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Err(match available {
        None => DbError::not_found("Product", &item.product_id),
        Some(available) => CoreError::InsufficientStock {
            code: item.code.clone(),
            available,
            requested: item.quantity,
        }
        .into(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::Duration;
    use fancy_core::gst::compute_totals;
    use fancy_core::{Product, SequenceError, TaxRate};
    use std::collections::HashSet;

    async fn add_product(db: &Database, code: &str, price: i64, bps: u32, stock: i64) -> Product {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: generate_product_id(),
                product_code: code.to_string(),
                name: format!("Product {code}"),
                category: "Earrings".to_string(),
                price: Money::from_paise(price),
                gst_rate: TaxRate::from_bps(bps),
                stock_quantity: stock,
                min_stock_level: 10,
                description: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    fn draft(lines: &[(&Product, i64)], phone: &str) -> InvoiceDraft {
        let inputs: Vec<_> = lines.iter().map(|(p, q)| p.to_line_input(*q)).collect();
        InvoiceDraft {
            customer_name: "Walk-in Customer".to_string(),
            customer_phone: phone.to_string(),
            customer_email: None,
            bill: compute_totals(&inputs, Money::zero()).unwrap(),
            payment_method: PaymentMethod::Upi,
            created_by: Some("cashier".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let seq = InvoiceSequencer::default();
        let p = add_product(&db, "ER001", 29_900, 1200, 50).await;

        let first = repo.create(&seq, &draft(&[(&p, 2)], "9876543210")).await.unwrap();
        let second = repo.create(&seq, &draft(&[(&p, 1)], "9876543210")).await.unwrap();

        assert_eq!(first.invoice_number, "FANCY0001");
        assert_eq!(second.invoice_number, "FANCY0002");
        assert_eq!(repo.last_identifier().await.unwrap().as_deref(), Some("FANCY0002"));
        assert_eq!(first.customer_id, second.customer_id);
    }

    #[tokio::test]
    async fn test_created_invoice_round_trips() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let a = add_product(&db, "ER001", 29_900, 1200, 50).await;
        let b = add_product(&db, "HC001", 14_900, 1800, 50).await;

        let created = repo
            .create(&InvoiceSequencer::default(), &draft(&[(&a, 2), (&b, 1)], "9876543210"))
            .await
            .unwrap();

        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.totals, created.totals);
        assert_eq!(loaded.items, created.items);
        assert_eq!(loaded.payment_method, PaymentMethod::Upi);
        assert_eq!(loaded.status, InvoiceStatus::Paid);
        assert!(loaded.totals.is_consistent());

        let by_number = repo.get_by_number("FANCY0001").await.unwrap().unwrap();
        assert_eq!(by_number.id, created.id);

        assert_eq!(db.products().get_by_id(&a.id).await.unwrap().unwrap().stock_quantity, 48);
        assert_eq!(db.products().get_by_id(&b.id).await.unwrap().unwrap().stock_quantity, 49);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let seq = InvoiceSequencer::default();
        let plenty = add_product(&db, "ER001", 29_900, 1200, 50).await;
        let scarce = add_product(&db, "ER002", 39_900, 1200, 1).await;

        let err = repo
            .create(&seq, &draft(&[(&plenty, 2), (&scarce, 3)], "9876543210"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));

        // No number consumed, no stock taken, no customer registered
        assert!(repo.last_identifier().await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(db.products().get_by_id(&plenty.id).await.unwrap().unwrap().stock_quantity, 50);
        assert_eq!(db.customers().count().await.unwrap(), 0);

        let ok = repo.create(&seq, &draft(&[(&plenty, 1)], "9876543210")).await.unwrap();
        assert_eq!(ok.invoice_number, "FANCY0001");
    }

    #[tokio::test]
    async fn test_corrupted_sequence_is_surfaced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = add_product(&db, "ER001", 29_900, 1200, 50).await;

        sqlx::query("UPDATE invoice_sequence SET last_identifier = 'FANCY00X7' WHERE id = 1")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .invoices()
            .create(&InvoiceSequencer::default(), &draft(&[(&p, 1)], "9876543210"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Sequence(SequenceError::InvalidSuffix { .. })));
        assert_eq!(db.invoices().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_void_keeps_number_and_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let seq = InvoiceSequencer::default();
        let p = add_product(&db, "ER001", 29_900, 1200, 10).await;

        let first = repo.create(&seq, &draft(&[(&p, 4)], "9876543210")).await.unwrap();
        let voided = repo.void(&first.id).await.unwrap();
        assert_eq!(voided.status, InvoiceStatus::Voided);
        assert_eq!(voided.invoice_number, "FANCY0001");
        assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().stock_quantity, 10);

        let next = repo.create(&seq, &draft(&[(&p, 1)], "9876543210")).await.unwrap();
        assert_eq!(next.invoice_number, "FANCY0002");

        let again = repo.void(&first.id).await.unwrap_err();
        assert!(matches!(
            again,
            DbError::Domain(CoreError::InvalidInvoiceStatus { .. })
        ));
        assert!(matches!(repo.void("missing").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_totals_survive_price_changes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut p = add_product(&db, "ER001", 29_900, 1200, 10).await;
        let created = db
            .invoices()
            .create(&InvoiceSequencer::default(), &draft(&[(&p, 1)], "9876543210"))
            .await
            .unwrap();

        p.price = Money::from_paise(99_900);
        p.gst_rate = TaxRate::from_bps(2800);
        db.products().update(&p).await.unwrap();

        let loaded = db.invoices().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.totals, created.totals);
        assert_eq!(loaded.items[0].unit_price.paise(), 29_900);
    }

    #[tokio::test]
    async fn test_stored_rate_stays_in_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = add_product(&db, "ER001", 29_900, 1200, 10).await;
        let created = db
            .invoices()
            .create(&InvoiceSequencer::default(), &draft(&[(&p, 1)], "9876543210"))
            .await
            .unwrap();

        for bps in [-1i64, 10_001, 4_294_968_496] {
            let result = sqlx::query("UPDATE invoice_items SET gst_rate_bps = ?1 WHERE invoice_id = ?2")
                .bind(bps)
                .bind(&created.id)
                .execute(db.pool())
                .await;
            assert!(result.is_err(), "{bps} bps was stored");
        }

        let items = db.invoices().get_items(&created.id).await.unwrap();
        assert_eq!(items[0].tax_rate, TaxRate::from_bps(1200));
    }

    #[tokio::test]
    async fn test_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let seq = InvoiceSequencer::default();
        let p = add_product(&db, "ER001", 29_900, 1200, 50).await;

        let a = repo.create(&seq, &draft(&[(&p, 1)], "9876543210")).await.unwrap();
        let b = repo.create(&seq, &draft(&[(&p, 1)], "9123456789")).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].invoice_number, b.invoice_number);
        assert_eq!(repo.list(Some(1)).await.unwrap().len(), 1);

        let customer_id = a.customer_id.clone().unwrap();
        let mine = repo.list_for_customer(&customer_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a.id);

        let today = Utc::now().date_naive();
        let in_range = repo.list_in_range(&DateRange::day(today)).await.unwrap();
        assert_eq!(in_range.len(), 2);
        assert_eq!(in_range[0].invoice_number, "FANCY0001");

        let tomorrow = today + Duration::days(1);
        let later = DateRange { start: Some(tomorrow), end: None };
        assert!(repo.list_in_range(&later).await.unwrap().is_empty());
        assert_eq!(repo.list_in_range(&DateRange::all()).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_share_a_number() {
        let path = std::env::temp_dir().join(format!("fancy-db-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let p = add_product(&db, "ER001", 29_900, 1200, 100).await;

        let mut handles = Vec::new();
        for i in 0..12 {
            let repo = db.invoices();
            let d = draft(&[(&p, 1)], &format!("98765432{i:02}"));
            handles.push(tokio::spawn(async move {
                repo.create(&InvoiceSequencer::default(), &d).await
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            let invoice = handle.await.unwrap().unwrap();
            numbers.insert(invoice.invoice_number);
        }

        assert_eq!(numbers.len(), 12);
        for n in 1..=12 {
            assert!(numbers.contains(&format!("FANCY{n:04}")));
        }
        assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().stock_quantity, 88);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}

//! # Billing Service
//!
//! Orchestrates checkout, invoice queries, reports and the dashboard on
//! top of `fancy-core` (math, numbering) and `fancy-db` (persistence).
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          checkout(request)                              │
//! │                                                                         │
//! │  1. Validate customer ──► name, phone normalized to 10 digits          │
//! │                                                                         │
//! │  2. Look up cart lines ──► ProductRepository::get_by_id                │
//! │     • unknown id       → NOT_FOUND                                      │
//! │     • quantity > stock → INSUFFICIENT_STOCK                             │
//! │                                                                         │
//! │  3. TaxCalculator::compute_totals ──► BillComputation                  │
//! │                                                                         │
//! │  4. InvoiceRepository::create ──► one transaction:                     │
//! │     number + customer + invoice + items + stock                         │
//! │                                                                         │
//! │  5. FinalizedInvoice ──► invoice document renderer / WhatsApp          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is checked twice: here for a friendly message, and again inside the
//! transaction, which is the check that actually holds under concurrency.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use ts_rs::TS;

use fancy_core::report::{self, ProductSales};
use fancy_core::validation::{
    validate_customer_name, validate_line_count, validate_phone, validate_quantity,
    validate_search_query,
};
use fancy_core::{
    BillComputation, CoreError, DateRange, Invoice, InvoiceNotification, InvoiceSequencer,
    LineItemInput, Money, PaymentMethod, Product, RoundOffPolicy, SalesReport, TaxCalculator,
};
use fancy_db::{Database, InvoiceDraft};

use crate::config::{StoreConfig, StoreProfile};
use crate::error::{ApiError, ApiResult};

/// Invoices shown in the dashboard's recent list.
const RECENT_INVOICES: u32 = 5;

/// Products shown in the dashboard's best-seller list.
const TOP_PRODUCTS: usize = 5;

// =============================================================================
// Requests & Responses
// =============================================================================

/// One cart line as sent by the billing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Checkout form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub customer_name: String,
    /// Any common Indian format; normalized before storage.
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub items: Vec<CartLine>,
    /// Flat discount applied after tax.
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Cashier name or ID.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Seller details printed at the top of the invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreHeader {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub gstin: String,
}

impl From<&StoreProfile> for StoreHeader {
    fn from(profile: &StoreProfile) -> Self {
        StoreHeader {
            name: profile.name.clone(),
            address: profile.address.clone(),
            phone: profile.phone.clone(),
            email: profile.email.clone(),
            gstin: profile.gstin.clone(),
        }
    }
}

/// Everything the invoice document needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizedInvoice {
    pub store: StoreHeader,
    pub invoice: Invoice,
}

/// Figures for the dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub today_sales: Money,
    pub today_invoices: usize,
    pub month_sales: Money,
    pub total_products: i64,
    pub total_customers: i64,
    pub low_stock: Vec<Product>,
    pub recent_invoices: Vec<Invoice>,
    pub top_products: Vec<ProductSales>,
}

// =============================================================================
// Service
// =============================================================================

/// The billing backend.
///
/// Cheap to clone; clones share the database pool.
#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
    calculator: TaxCalculator,
    sequencer: InvoiceSequencer,
    store: StoreHeader,
}

impl BillingService {
    /// Builds the service from a loaded configuration.
    pub fn new(db: Database, config: &StoreConfig) -> ApiResult<Self> {
        Ok(BillingService {
            db,
            calculator: config.calculator(),
            sequencer: config.sequencer()?,
            store: StoreHeader::from(&config.store),
        })
    }

    pub fn store(&self) -> &StoreHeader {
        &self.store
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// How grand totals are rounded at checkout.
    pub fn round_off_policy(&self) -> RoundOffPolicy {
        self.calculator.round_off_policy()
    }

    /// Finalizes a sale: prices the cart, assigns the invoice number and
    /// persists everything in one transaction.
    pub async fn checkout(&self, request: &CheckoutRequest) -> ApiResult<FinalizedInvoice> {
        let (customer_phone, bill) = self.prepare(request).await?;

        let draft = InvoiceDraft {
            customer_name: request.customer_name.trim().to_string(),
            customer_phone,
            customer_email: request
                .customer_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            bill,
            payment_method: request.payment_method,
            created_by: request.created_by.clone(),
        };

        let invoice = self.db.invoices().create(&self.sequencer, &draft).await?;

        info!(
            invoice_number = %invoice.invoice_number,
            payment_method = %invoice.payment_method,
            grand_total = %invoice.totals.grand_total,
            "Checkout complete"
        );

        Ok(FinalizedInvoice {
            store: self.store.clone(),
            invoice,
        })
    }

    /// Prices a cart without saving anything.
    pub async fn preview(&self, request: &CheckoutRequest) -> ApiResult<BillComputation> {
        let (_, bill) = self.prepare(request).await?;
        Ok(bill)
    }

    /// Product suggestions for the billing page search box.
    pub async fn search_products(&self, query: &str, limit: u32) -> ApiResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        Ok(self.db.products().search(&query, limit).await?)
    }

    /// Loads an invoice with its items.
    pub async fn invoice(&self, id: &str) -> ApiResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()).into())
    }

    /// Invoices, newest first.
    pub async fn invoices(&self, limit: Option<u32>) -> ApiResult<Vec<Invoice>> {
        Ok(self.db.invoices().list(limit).await?)
    }

    /// Voids a paid invoice. Its number is never reissued.
    pub async fn void_invoice(&self, id: &str) -> ApiResult<Invoice> {
        Ok(self.db.invoices().void(id).await?)
    }

    /// A customer's purchase history, newest first.
    pub async fn customer_invoices(&self, customer_id: &str) -> ApiResult<Vec<Invoice>> {
        if self.db.customers().get_by_id(customer_id).await?.is_none() {
            return Err(ApiError::not_found("Customer", customer_id));
        }
        Ok(self.db.invoices().list_for_customer(customer_id).await?)
    }

    /// Sales summary for a date range; voided invoices are listed but not counted.
    pub async fn sales_report(&self, range: DateRange) -> ApiResult<SalesReport> {
        let invoices = self.db.invoices().list_in_range(&range).await?;
        debug!(invoices = invoices.len(), "Building sales report");
        Ok(report::summarize(range, invoices))
    }

    /// The WhatsApp message for an invoice.
    pub async fn notification(&self, id: &str) -> ApiResult<InvoiceNotification> {
        let invoice = self.invoice(id).await?;
        Ok(InvoiceNotification::compose(&invoice, &self.store.name))
    }

    /// The number the next checkout will receive, unless another checkout
    /// commits first. Nothing is reserved.
    pub async fn next_invoice_number(&self) -> ApiResult<String> {
        let last = self.db.invoices().last_identifier().await?;
        Ok(self.sequencer.next_identifier(last.as_deref())?)
    }

    /// Dashboard figures. "Today" and "this month" are UTC calendar dates.
    pub async fn dashboard(&self) -> ApiResult<DashboardSummary> {
        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);

        let today_report = self.sales_report(DateRange::day(today)).await?;
        let month_report = self
            .sales_report(DateRange {
                start: Some(month_start),
                end: Some(today),
            })
            .await?;

        let all_invoices = self.db.invoices().list(None).await?;

        Ok(DashboardSummary {
            today_sales: today_report.total_sales,
            today_invoices: today_report.total_invoices,
            month_sales: month_report.total_sales,
            total_products: self.db.products().count().await?,
            total_customers: self.db.customers().count().await?,
            low_stock: self.db.products().low_stock().await?,
            recent_invoices: all_invoices
                .iter()
                .take(RECENT_INVOICES as usize)
                .cloned()
                .collect(),
            top_products: report::top_products(&all_invoices, TOP_PRODUCTS),
        })
    }

    /// Validates the customer, resolves the cart against the catalog and
    /// prices it. Returns the normalized phone and the bill.
    async fn prepare(&self, request: &CheckoutRequest) -> ApiResult<(String, BillComputation)> {
        validate_customer_name(&request.customer_name)?;
        let phone = validate_phone(&request.customer_phone)?;
        validate_line_count(request.items.len())?;

        let products = self.db.products();
        let mut requested: HashMap<&str, i64> = HashMap::new();
        let mut inputs: Vec<LineItemInput> = Vec::with_capacity(request.items.len());

        for line in &request.items {
            validate_quantity(line.quantity)?;

            let product = products
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            // Same product on several lines draws from one stock count
            let total = requested.entry(line.product_id.as_str()).or_insert(0);
            *total += line.quantity;
            if !product.can_sell(*total) {
                return Err(CoreError::InsufficientStock {
                    code: product.product_code.clone(),
                    available: product.stock_quantity,
                    requested: *total,
                }
                .into());
            }

            inputs.push(product.to_line_input(line.quantity));
        }

        let bill = self.calculator.compute_totals(&inputs, request.discount)?;
        Ok((phone, bill))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use fancy_core::{InvoiceStatus, RoundOffPolicy, TaxRate};
    use fancy_db::{generate_product_id, DbConfig};

    async fn setup(config: &StoreConfig) -> (BillingService, Product, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let earrings = add_product(&db, "ER001", "Crystal Drop Earrings", 29_900, 1200, 50).await;
        let clip = add_product(&db, "HC001", "Butterfly Hair Clip", 14_900, 1800, 3).await;
        (BillingService::new(db, config).unwrap(), earrings, clip)
    }

    async fn add_product(db: &Database, code: &str, name: &str, price: i64, bps: u32, stock: i64) -> Product {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: generate_product_id(),
                product_code: code.to_string(),
                name: name.to_string(),
                category: "Accessories".to_string(),
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

    fn request(lines: &[(&Product, i64)]) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Priya Sharma".to_string(),
            customer_phone: "+91 98765-43210".to_string(),
            customer_email: Some("  ".to_string()),
            items: lines
                .iter()
                .map(|(p, q)| CartLine {
                    product_id: p.id.clone(),
                    quantity: *q,
                })
                .collect(),
            discount: Money::zero(),
            payment_method: PaymentMethod::Upi,
            created_by: Some("counter-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_checkout() {
        let (service, earrings, _) = setup(&StoreConfig::default()).await;

        let finalized = service.checkout(&request(&[(&earrings, 2)])).await.unwrap();
        let invoice = &finalized.invoice;

        assert_eq!(finalized.store.name, "Fancy Store");
        assert_eq!(invoice.invoice_number, "FANCY0001");
        assert_eq!(invoice.customer_phone, "9876543210");
        assert_eq!(invoice.totals.subtotal.paise(), 59_800);
        assert_eq!(invoice.totals.cgst.paise(), 3_588);
        assert_eq!(invoice.totals.sgst.paise(), 3_588);
        assert_eq!(invoice.totals.grand_total.paise(), 66_976);
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        let customer = service
            .database()
            .customers()
            .get_by_phone("9876543210")
            .await
            .unwrap()
            .unwrap();
        assert!(customer.email.is_none());

        assert_eq!(service.next_invoice_number().await.unwrap(), "FANCY0002");
    }

    #[tokio::test]
    async fn test_rupee_round_off() {
        let mut config = StoreConfig::default();
        config.billing.round_off = RoundOffPolicy::NearestRupee;
        let (service, earrings, _) = setup(&config).await;

        assert_eq!(service.round_off_policy(), RoundOffPolicy::NearestRupee);

        let invoice = service.checkout(&request(&[(&earrings, 2)])).await.unwrap().invoice;
        assert_eq!(invoice.totals.grand_total.paise(), 67_000);
        assert_eq!(invoice.totals.round_off.paise(), 24);
        assert!(invoice.totals.is_consistent());
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let (service, earrings, clip) = setup(&StoreConfig::default()).await;

        let bill = service.preview(&request(&[(&earrings, 1), (&clip, 1)])).await.unwrap();
        assert_eq!(bill.items.len(), 2);
        assert!(bill.totals.is_consistent());

        assert_eq!(service.invoices(None).await.unwrap().len(), 0);
        assert_eq!(service.next_invoice_number().await.unwrap(), "FANCY0001");
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let (service, earrings, clip) = setup(&StoreConfig::default()).await;

        // Split across lines, 2 + 2 exceeds the 3 in stock
        let err = service
            .checkout(&request(&[(&clip, 2), (&clip, 2)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let mut bad_phone = request(&[(&earrings, 1)]);
        bad_phone.customer_phone = "12345".to_string();
        assert_eq!(service.checkout(&bad_phone).await.unwrap_err().code, ErrorCode::ValidationError);

        let mut big_discount = request(&[(&earrings, 1)]);
        big_discount.discount = Money::from_rupees(1_000);
        assert_eq!(
            service.checkout(&big_discount).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        let mut unknown = request(&[(&earrings, 1)]);
        unknown.items[0].product_id = "missing".to_string();
        assert_eq!(service.checkout(&unknown).await.unwrap_err().code, ErrorCode::NotFound);

        assert_eq!(service.checkout(&request(&[])).await.unwrap_err().code, ErrorCode::ValidationError);

        // Nothing above consumed a number
        assert_eq!(service.next_invoice_number().await.unwrap(), "FANCY0001");
    }

    #[tokio::test]
    async fn test_void_and_report() {
        let (service, earrings, clip) = setup(&StoreConfig::default()).await;

        let kept = service.checkout(&request(&[(&earrings, 2)])).await.unwrap().invoice;
        let voided = service.checkout(&request(&[(&clip, 1)])).await.unwrap().invoice;
        service.void_invoice(&voided.id).await.unwrap();

        let err = service.void_invoice(&voided.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let report = service.sales_report(DateRange::all()).await.unwrap();
        assert_eq!(report.total_invoices, 1);
        assert_eq!(report.voided_invoices, 1);
        assert_eq!(report.total_sales, kept.totals.grand_total);
        assert_eq!(report.total_gst, kept.totals.total_tax);
        assert_eq!(report.invoices[0].unit_count(), 2);
        assert_eq!(report.invoices[1].unit_count(), 1);

        let next = service.checkout(&request(&[(&clip, 1)])).await.unwrap().invoice;
        assert_eq!(next.invoice_number, "FANCY0003");
    }

    #[tokio::test]
    async fn test_lookups() {
        let (service, earrings, _) = setup(&StoreConfig::default()).await;
        let invoice = service.checkout(&request(&[(&earrings, 1)])).await.unwrap().invoice;

        assert_eq!(service.invoice(&invoice.id).await.unwrap(), invoice);
        assert_eq!(service.invoice("missing").await.unwrap_err().code, ErrorCode::NotFound);

        let customer_id = invoice.customer_id.clone().unwrap();
        assert_eq!(service.customer_invoices(&customer_id).await.unwrap().len(), 1);
        assert_eq!(
            service.customer_invoices("missing").await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let message = service.notification(&invoice.id).await.unwrap();
        assert_eq!(message.to, "whatsapp:+919876543210");
        assert!(message.body.contains("FANCY0001"));
        assert!(message.body.contains("Fancy Store"));

        let found = service.search_products("drop", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_code, "ER001");
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (service, earrings, clip) = setup(&StoreConfig::default()).await;
        service.checkout(&request(&[(&earrings, 2)])).await.unwrap();
        service.checkout(&request(&[(&clip, 1), (&earrings, 1)])).await.unwrap();

        let summary = service.dashboard().await.unwrap();
        assert_eq!(summary.today_invoices, 2);
        assert_eq!(summary.today_sales, summary.month_sales);
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_customers, 1);
        assert_eq!(summary.recent_invoices.len(), 2);
        assert_eq!(summary.recent_invoices[0].invoice_number, "FANCY0002");
        assert_eq!(summary.top_products[0].code, "ER001");
        assert_eq!(summary.top_products[0].quantity, 3);
        // Clip stock 3 - 1 = 2, below its minimum of 10
        assert!(summary.low_stock.iter().any(|p| p.product_code == "HC001"));
    }
}

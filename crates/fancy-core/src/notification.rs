//! # Invoice Notification
//!
//! Builds the WhatsApp message sent to a customer after checkout.
//!
//! Only the message is produced here. Delivery belongs to whichever
//! messaging provider the deployment wires in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Invoice;

/// Country code prepended to bare 10-digit numbers.
const INDIA_DIALING_PREFIX: &str = "+91";

/// A ready-to-send invoice message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceNotification {
    /// Recipient address, e.g. `whatsapp:+919876543210`.
    pub to: String,
    /// Message text.
    pub body: String,
}

impl InvoiceNotification {
    /// Composes the message for `invoice`.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use fancy_core::notification::InvoiceNotification;
    /// use fancy_core::{Invoice, InvoiceStatus, InvoiceTotals, Money, PaymentMethod};
    ///
    /// let invoice = Invoice {
    ///     id: "inv-1".to_string(),
    ///     invoice_number: "FANCY0042".to_string(),
    ///     customer_id: None,
    ///     customer_name: "Priya".to_string(),
    ///     customer_phone: "9876543210".to_string(),
    ///     totals: InvoiceTotals {
    ///         grand_total: Money::from_paise(66_976),
    ///         ..Default::default()
    ///     },
    ///     payment_method: PaymentMethod::Upi,
    ///     status: InvoiceStatus::Paid,
    ///     created_by: None,
    ///     created_at: Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap(),
    ///     items: vec![],
    /// };
    ///
    /// let msg = InvoiceNotification::compose(&invoice, "Fancy Store");
    /// assert_eq!(msg.to, "whatsapp:+919876543210");
    /// assert!(msg.body.contains("Total: ₹669.76"));
    /// assert!(msg.body.contains("Date: 05-03-2024"));
    /// ```
    pub fn compose(invoice: &Invoice, store_name: &str) -> Self {
        let body = format!(
            "Hello {name},\n\
             \n\
             Thank you for shopping at {store}!\n\
             \n\
             Invoice: {number}\n\
             Total: {total}\n\
             Date: {date}\n\
             \n\
             Your invoice has been generated. Visit our store again!",
            name = invoice.customer_name,
            store = store_name,
            number = invoice.invoice_number,
            total = invoice.totals.grand_total,
            date = invoice.created_at.format("%d-%m-%Y"),
        );

        InvoiceNotification {
            to: whatsapp_address(&invoice.customer_phone),
            body,
        }
    }
}

/// `9876543210` → `whatsapp:+919876543210`.
pub fn whatsapp_address(phone: &str) -> String {
    let phone = phone.trim();
    if phone.starts_with(INDIA_DIALING_PREFIX) {
        format!("whatsapp:{phone}")
    } else {
        format!("whatsapp:{INDIA_DIALING_PREFIX}{phone}")
    }
}

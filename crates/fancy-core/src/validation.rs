//! # Validation Module
//!
//! Input validation for Fancy Store Billing.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Billing page (client scripts)                                │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate cashier feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: BillingService / TaxCalculator (Rust)                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE(invoice_number), UNIQUE(phone), UNIQUE(product_code)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fancy_core::validation::{validate_phone, validate_quantity};
//!
//! assert_eq!(validate_phone("+91 98765 43210").unwrap(), "9876543210");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{GstSlabs, TaxRate};
use crate::{MAX_INVOICE_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted invoice prefix.
const MAX_PREFIX_LEN: usize = 12;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code such as `ER001`.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Letters, digits and hyphens only
///
/// ## Example
/// ```rust
/// use fancy_core::validation::validate_product_code;
///
/// assert!(validate_product_code("ER001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("ER 001").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("product_code"));
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: 20,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::invalid_format(
            "product_code",
            "must contain only letters, numbers and hyphens",
        ));
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer name (at most 100 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("customer_name"));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates and normalizes an Indian phone number.
///
/// ## Rules
/// - Spaces, hyphens and parentheses are ignored
/// - An optional `+91`, `91` or `0` prefix is stripped
/// - What remains must be exactly 10 digits
///
/// ## Returns
/// The bare 10-digit number, the form stored in `customers.phone`.
///
/// ## Example
/// ```rust
/// use fancy_core::validation::validate_phone;
///
/// assert_eq!(validate_phone("98765 43210").unwrap(), "9876543210");
/// assert_eq!(validate_phone("+91-98765-43210").unwrap(), "9876543210");
/// assert_eq!(validate_phone("09876543210").unwrap(), "9876543210");
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let digits = if let Some(rest) = compact.strip_prefix("+91") {
        rest
    } else if compact.len() == 12 && compact.starts_with("91") {
        &compact[2..]
    } else if compact.len() == 11 && compact.starts_with('0') {
        &compact[1..]
    } else {
        compact.as_str()
    };

    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "phone",
            "must be a 10-digit mobile number",
        ));
    }

    Ok(digits.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (matches everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an invoice number prefix.
///
/// ## Rules
/// - Must not be empty
/// - At most 12 characters, ASCII letters, digits, `-` or `/`
/// - Must not end in a digit (the numeric part must be unambiguous)
///
/// ```rust
/// use fancy_core::validation::validate_invoice_prefix;
///
/// assert!(validate_invoice_prefix("FANCY").is_ok());
/// assert!(validate_invoice_prefix("FS/2024-").is_ok());
/// assert!(validate_invoice_prefix("FANCY1").is_err());
/// ```
pub fn validate_invoice_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::required("invoice_prefix"));
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "invoice_prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err(ValidationError::invalid_format(
            "invoice_prefix",
            "must contain only letters, numbers, '-' and '/'",
        ));
    }

    if prefix.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "invoice_prefix",
            "must not end with a digit",
        ));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Cashier Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Billing page: change quantity                                          │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → line is priced                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items).
///
/// ```rust
/// use fancy_core::money::Money;
/// use fancy_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_paise(29_900)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_paise(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a GST rate against the permitted slabs.
pub fn validate_tax_rate(rate: TaxRate, slabs: &GstSlabs) -> ValidationResult<()> {
    if !slabs.contains(rate) {
        return Err(ValidationError::NotAllowed {
            field: "tax_rate".to_string(),
            allowed: slabs.labels(),
        });
    }

    Ok(())
}

/// Validates a flat discount against the amount payable before discount.
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed `payable` (subtotal + total tax)
pub fn validate_discount(discount: Money, payable: Money) -> ValidationResult<()> {
    if discount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: payable.paise(),
        });
    }

    if discount > payable {
        return Err(ValidationError::DiscountExceedsPayable {
            discount: discount.to_string(),
            payable: payable.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on one invoice.
///
/// ## Rules
/// - At least one line
/// - At most MAX_INVOICE_ITEMS (100)
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::required("items"));
    }

    if lines > MAX_INVOICE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_INVOICE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for fancy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fancy-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Malformed or out-of-policy input               │
//! │  └── SequenceError    - Corrupted previous invoice number              │
//! │                                                                         │
//! │  fancy-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apps/billing errors                                                   │
//! │  └── ApiError         - What the client scripts see (serialized)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are returned to the caller, never logged-and-swallowed here.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Invoice cannot be found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Insufficient stock to complete the checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "ER001", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Billing page shows: "Only 3 ER001 in stock"
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Invoice is not in a state that allows the requested operation.
    #[error("Invoice {invoice_number} is {current_status}, cannot perform operation")]
    InvalidInvoiceStatus {
        invoice_number: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invoice numbering error (wraps SequenceError).
    #[error("Invoice numbering error: {0}")]
    Sequence(#[from] SequenceError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any computation runs; a failed validation never yields a
/// partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone number, decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set (e.g., a GST rate outside the slabs).
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Discount is larger than what the customer owes.
    #[error("Discount {discount} exceeds payable amount {payable}")]
    DiscountExceedsPayable { discount: String, payable: String },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required { field: field.into() }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sequence Error
// =============================================================================

/// The previously issued invoice number could not be continued.
///
/// Always surfaced: restarting the sequence would mint duplicate numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The stored number does not start with the configured prefix.
    #[error("Invoice number '{identifier}' does not start with prefix '{prefix}'")]
    PrefixMismatch { identifier: String, prefix: String },

    /// The part after the prefix is not a decimal integer.
    #[error("Invoice number '{identifier}' has a non-numeric suffix '{suffix}'")]
    InvalidSuffix { identifier: String, suffix: String },

    /// Incrementing would overflow.
    #[error("Invoice number '{identifier}' cannot be incremented further")]
    Overflow { identifier: String },

    /// The configured prefix is unusable (empty or ends in a digit).
    #[error("Invalid invoice prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "ER001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for ER001: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("items").to_string(), "items is required");

        let err = ValidationError::DiscountExceedsPayable {
            discount: "₹500.00".to_string(),
            payable: "₹335.00".to_string(),
        };
        assert_eq!(err.to_string(), "Discount ₹500.00 exceeds payable amount ₹335.00");
    }

    #[test]
    fn test_sequence_error_messages() {
        let err = SequenceError::InvalidSuffix {
            identifier: "FANCY00A1".to_string(),
            suffix: "00A1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invoice number 'FANCY00A1' has a non-numeric suffix '00A1'"
        );
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = SequenceError::Overflow {
            identifier: "X".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Sequence(_)));
    }
}

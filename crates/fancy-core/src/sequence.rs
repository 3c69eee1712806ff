//! # Invoice Sequencer
//!
//! Derives the next invoice number from the last one issued.
//!
//! ## Format
//! ```text
//!   FANCY 0042
//!   ───── ────
//!   prefix  zero-padded to at least 4 digits, grows past 9999
//!
//!   None        → FANCY0001
//!   FANCY0001   → FANCY0002
//!   FANCY9999   → FANCY10000
//!   FANCYxyz    → SequenceError::InvalidSuffix   (never a silent restart)
//! ```
//!
//! The sequencer holds no counter. The last issued number lives in the
//! database and `fancy-db` runs read → [`InvoiceSequencer::next_identifier`]
//! → write inside one transaction.

use serde::{Deserialize, Serialize};

use crate::error::SequenceError;
use crate::validation::validate_invoice_prefix;
use crate::{DEFAULT_INVOICE_PREFIX, INVOICE_NUMBER_WIDTH};

/// Prefix + zero-padded counter invoice numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSequencer {
    prefix: String,
    width: usize,
}

impl InvoiceSequencer {
    /// Creates a sequencer for `prefix` with the default width of 4.
    ///
    /// ## Errors
    /// [`SequenceError::InvalidPrefix`] when the prefix is empty, too long,
    /// contains unsupported characters or ends with a digit.
    pub fn new(prefix: impl Into<String>) -> Result<Self, SequenceError> {
        let prefix = prefix.into();
        validate_invoice_prefix(&prefix).map_err(|e| SequenceError::InvalidPrefix {
            prefix: prefix.clone(),
            reason: e.to_string(),
        })?;

        Ok(InvoiceSequencer {
            prefix,
            width: INVOICE_NUMBER_WIDTH,
        })
    }

    /// Sets the minimum number of digits (default: 4, so `0001`).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Formats a counter value, e.g. `42` → `FANCY0042`.
    pub fn format_number(&self, number: u64) -> String {
        format!("{}{:0>width$}", self.prefix, number, width = self.width)
    }

    /// Extracts the counter from an issued number, e.g. `FANCY0042` → `42`.
    pub fn parse_number(&self, identifier: &str) -> Result<u64, SequenceError> {
        let suffix = identifier
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| SequenceError::PrefixMismatch {
                identifier: identifier.to_string(),
                prefix: self.prefix.clone(),
            })?;

        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return Err(SequenceError::InvalidSuffix {
                identifier: identifier.to_string(),
                suffix: suffix.to_string(),
            });
        }

        // All digits, so the only possible failure is magnitude.
        suffix.parse::<u64>().map_err(|_| SequenceError::Overflow {
            identifier: identifier.to_string(),
        })
    }

    /// Returns the number that follows `previous`.
    ///
    /// ```rust
    /// use fancy_core::sequence::InvoiceSequencer;
    ///
    /// let seq = InvoiceSequencer::new("FANCY").unwrap();
    /// assert_eq!(seq.next_identifier(None).unwrap(), "FANCY0001");
    /// assert_eq!(seq.next_identifier(Some("FANCY0041")).unwrap(), "FANCY0042");
    /// assert_eq!(seq.next_identifier(Some("FANCY9999")).unwrap(), "FANCY10000");
    /// assert!(seq.next_identifier(Some("SHOP0001")).is_err());
    /// ```
    pub fn next_identifier(&self, previous: Option<&str>) -> Result<String, SequenceError> {
        let Some(previous) = previous else {
            return Ok(self.format_number(1));
        };

        let next = self
            .parse_number(previous)?
            .checked_add(1)
            .ok_or_else(|| SequenceError::Overflow {
                identifier: previous.to_string(),
            })?;

        Ok(self.format_number(next))
    }
}

impl Default for InvoiceSequencer {
    fn default() -> Self {
        InvoiceSequencer {
            prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            width: INVOICE_NUMBER_WIDTH,
        }
    }
}

/// Next invoice number for `prefix` at the default width.
pub fn next_identifier(prefix: &str, previous: Option<&str>) -> Result<String, SequenceError> {
    InvoiceSequencer::new(prefix)?.next_identifier(previous)
}

// =============================================================================
// Unit Tests
// =============================================================================

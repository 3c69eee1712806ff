//! # GST Calculation Module
//!
//! Turns cart lines into invoice totals with the intra-state CGST + SGST split.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     compute_totals(items, discount)                     │
//! │                                                                         │
//! │  for each line:                                                         │
//! │      validate ──► line_total = qty × unit_price      (exact, paise)     │
//! │                   line_tax   = line_total × bps      (exact, 1/10⁴ p)   │
//! │                                                                         │
//! │  subtotal   = Σ line_total                                              │
//! │  total_tax  = round(Σ line_tax)          ◄── rounded ONCE               │
//! │  cgst, sgst = round(Σ line_tax / 2) each                                │
//! │               sgst corrected so cgst + sgst == total_tax                │
//! │                                                                         │
//! │  payable     = subtotal + total_tax                                     │
//! │  discount    ≤ payable, else ValidationError                            │
//! │  grand_total = round(payable - discount)  per RoundOffPolicy            │
//! │  round_off   = grand_total - (payable - discount)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Not Round Per Line?
//! Ten lines of ₹0.10 at 5% carry 0.5 paise of tax each. Rounding per line
//! bills 10 paise; summing first bills 5. The per-line `tax_amount` on
//! [`LineItem`] is display-only and never feeds the totals.

use crate::error::ValidationError;
use crate::money::{ExactAmount, Money};
use crate::types::{BillComputation, GstSlabs, InvoiceTotals, LineItem, LineItemInput, RoundOffPolicy};
use crate::validation::{
    validate_discount, validate_line_count, validate_price, validate_product_code,
    validate_product_name, validate_quantity, validate_tax_rate, ValidationResult,
};

// =============================================================================
// Tax Calculator
// =============================================================================

/// Computes invoice totals under a fixed slab set and round-off policy.
///
/// Stateless apart from its configuration; one instance can be shared by
/// every checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxCalculator {
    slabs: GstSlabs,
    round_off: RoundOffPolicy,
}

impl TaxCalculator {
    /// Creates a calculator with explicit slabs and round-off policy.
    pub fn new(slabs: GstSlabs, round_off: RoundOffPolicy) -> Self {
        TaxCalculator { slabs, round_off }
    }

    /// Creates a calculator with custom slabs and paisa round-off.
    pub fn with_slabs(slabs: GstSlabs) -> Self {
        TaxCalculator {
            slabs,
            round_off: RoundOffPolicy::NearestPaisa,
        }
    }

    pub fn slabs(&self) -> &GstSlabs {
        &self.slabs
    }

    pub fn round_off_policy(&self) -> RoundOffPolicy {
        self.round_off
    }

    /// Validates and prices one line.
    ///
    /// Returns the frozen line plus its exact, unrounded tax.
    pub fn price_line(&self, input: &LineItemInput) -> ValidationResult<(LineItem, ExactAmount)> {
        validate_product_name(&input.name)?;
        validate_product_code(&input.code)?;
        validate_quantity(input.quantity)?;
        validate_price(input.unit_price)?;
        validate_tax_rate(input.tax_rate, &self.slabs)?;

        let line_total = input
            .unit_price
            .paise()
            .checked_mul(input.quantity)
            .map(Money::from_paise)
            .ok_or_else(|| ValidationError::invalid_format("unit_price", "line total too large"))?;

        let exact_tax = line_total.calculate_tax(input.tax_rate);

        let line = LineItem {
            product_id: input.product_id.clone(),
            name: input.name.trim().to_string(),
            code: input.code.trim().to_string(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            tax_rate: input.tax_rate,
            line_total,
            tax_amount: exact_tax.round_to_paise(),
        };

        Ok((line, exact_tax))
    }

    /// Computes the totals for a bill.
    ///
    /// ## Errors
    /// [`ValidationError`] when there are no lines or too many, when any
    /// line is out of policy, or when the discount is negative or larger
    /// than subtotal + total tax. Nothing is returned on failure.
    ///
    /// ## Example
    /// ```rust
    /// use fancy_core::gst::TaxCalculator;
    /// use fancy_core::{GstSlabs, LineItemInput, Money, RoundOffPolicy, TaxRate};
    ///
    /// let calc = TaxCalculator::new(GstSlabs::default(), RoundOffPolicy::NearestRupee);
    /// let items = vec![LineItemInput {
    ///     product_id: "p-1".to_string(),
    ///     name: "Crystal Drop Earrings".to_string(),
    ///     code: "ER001".to_string(),
    ///     quantity: 2,
    ///     unit_price: Money::from_paise(29_900),
    ///     tax_rate: TaxRate::from_bps(1200),
    /// }];
    ///
    /// let bill = calc.compute_totals(&items, Money::zero()).unwrap();
    /// assert_eq!(bill.totals.grand_total.paise(), 67_000);
    /// assert_eq!(bill.totals.round_off.paise(), 24);
    /// ```
    pub fn compute_totals(
        &self,
        items: &[LineItemInput],
        discount: Money,
    ) -> ValidationResult<BillComputation> {
        validate_line_count(items.len())?;

        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal = Money::zero();
        let mut exact_tax = ExactAmount::zero();

        for input in items {
            let (line, line_tax) = self.price_line(input)?;
            subtotal = subtotal
                .checked_add(line.line_total)
                .ok_or_else(|| ValidationError::invalid_format("items", "subtotal too large"))?;
            exact_tax += line_tax;
            lines.push(line);
        }

        let (total_tax, cgst, sgst) = split_tax(exact_tax);

        let too_large = || ValidationError::invalid_format("items", "total too large");

        let payable = subtotal.checked_add(total_tax).ok_or_else(too_large)?;
        validate_discount(discount, payable)?;

        let before_round_off = payable.checked_sub(discount).ok_or_else(too_large)?;
        let grand_total = match self.round_off {
            RoundOffPolicy::NearestPaisa => before_round_off,
            RoundOffPolicy::NearestRupee => before_round_off
                .to_exact()
                .checked_round_to_rupee()
                .ok_or_else(too_large)?,
        };
        let round_off = grand_total.checked_sub(before_round_off).ok_or_else(too_large)?;

        Ok(BillComputation {
            items: lines,
            totals: InvoiceTotals {
                subtotal,
                cgst,
                sgst,
                total_tax,
                discount,
                round_off,
                grand_total,
            },
        })
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Computes totals with the standard slabs and paisa round-off.
pub fn compute_totals(items: &[LineItemInput], discount: Money) -> ValidationResult<BillComputation> {
    TaxCalculator::default().compute_totals(items, discount)
}

/// Splits an exact tax amount into `(total_tax, cgst, sgst)`.
///
/// Each half is rounded on its own. When the halves miss the rounded total
/// by a paisa, SGST absorbs the difference.
///
/// ```rust
/// use fancy_core::gst::split_tax;
/// use fancy_core::money::Money;
/// use fancy_core::types::TaxRate;
///
/// // ₹0.99 at 5%: 4.95 paise → 5 total, halves 2.475 → 2 + 2, SGST takes 3
/// let exact = Money::from_paise(99).calculate_tax(TaxRate::from_bps(500));
/// let (total, cgst, sgst) = split_tax(exact);
/// assert_eq!((total.paise(), cgst.paise(), sgst.paise()), (5, 2, 3));
/// ```
pub fn split_tax(exact_tax: ExactAmount) -> (Money, Money, Money) {
    let total_tax = exact_tax.round_to_paise();
    let cgst = exact_tax.half_round_to_paise();
    let mut sgst = exact_tax.half_round_to_paise();

    if cgst + sgst != total_tax {
        sgst = total_tax - cgst;
    }

    (total_tax, cgst, sgst)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxRate;
    use crate::MAX_INVOICE_ITEMS;

    fn line(code: &str, quantity: i64, price_paise: i64, rate_bps: u32) -> LineItemInput {
        LineItemInput {
            product_id: format!("id-{code}"),
            name: format!("Product {code}"),
            code: code.to_string(),
            quantity,
            unit_price: Money::from_paise(price_paise),
            tax_rate: TaxRate::from_bps(rate_bps),
        }
    }

    #[test]
    fn test_single_line_bill() {
        let bill = compute_totals(&[line("ER001", 2, 29_900, 1200)], Money::zero()).unwrap();

        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.items[0].line_total.paise(), 59_800);
        assert_eq!(bill.items[0].tax_amount.paise(), 7_176);

        let t = bill.totals;
        assert_eq!(t.subtotal.paise(), 59_800);
        assert_eq!(t.total_tax.paise(), 7_176);
        assert_eq!(t.cgst.paise(), 3_588);
        assert_eq!(t.sgst.paise(), 3_588);
        assert_eq!(t.round_off.paise(), 0);
        assert_eq!(t.grand_total.paise(), 66_976);
        assert!(t.is_consistent());
    }

    #[test]
    fn test_mixed_rates() {
        // 1 × ₹599 @12% + 3 × ₹99 @18%
        let items = [line("BG001", 1, 59_900, 1200), line("CL001", 3, 9_900, 1800)];
        let bill = compute_totals(&items, Money::zero()).unwrap();

        // 7188 + 5346 = 12534
        assert_eq!(bill.totals.subtotal.paise(), 89_600);
        assert_eq!(bill.totals.total_tax.paise(), 12_534);
        assert_eq!(bill.totals.grand_total.paise(), 102_134);
        assert!(bill.totals.is_consistent());
    }

    #[test]
    fn test_tax_is_summed_before_rounding() {
        // 0.5 paise of tax per line; rounding per line would bill 3 paise
        let items = [line("A1", 1, 10, 500), line("A2", 1, 10, 500), line("A3", 1, 10, 500)];
        let bill = compute_totals(&items, Money::zero()).unwrap();

        assert!(bill.items.iter().all(|l| l.tax_amount.paise() == 1));
        assert_eq!(bill.totals.total_tax.paise(), 2);
        assert_eq!(bill.totals.cgst.paise(), 1);
        assert_eq!(bill.totals.sgst.paise(), 1);
    }

    #[test]
    fn test_odd_paisa_goes_to_sgst() {
        let bill = compute_totals(&[line("X1", 1, 99, 500)], Money::zero()).unwrap();
        assert_eq!(bill.totals.total_tax.paise(), 5);
        assert_eq!(bill.totals.cgst.paise(), 2);
        assert_eq!(bill.totals.sgst.paise(), 3);

        // 5 paise exact: halves 2.5 → 3 + 3, SGST corrected down
        let bill = compute_totals(&[line("X2", 1, 100, 500)], Money::zero()).unwrap();
        assert_eq!(bill.totals.cgst.paise(), 3);
        assert_eq!(bill.totals.sgst.paise(), 2);
        assert!(bill.totals.is_consistent());
    }

    #[test]
    fn test_zero_rated_and_free_items() {
        let items = [line("Z1", 4, 5_000, 0), line("F1", 1, 0, 1800)];
        let bill = compute_totals(&items, Money::zero()).unwrap();

        assert_eq!(bill.totals.subtotal.paise(), 20_000);
        assert_eq!(bill.totals.total_tax.paise(), 0);
        assert_eq!(bill.totals.grand_total.paise(), 20_000);
    }

    #[test]
    fn test_discount_is_post_tax() {
        let bill = compute_totals(&[line("ER001", 2, 29_900, 1200)], Money::from_paise(5_000)).unwrap();

        // Tax is computed on the undiscounted subtotal
        assert_eq!(bill.totals.total_tax.paise(), 7_176);
        assert_eq!(bill.totals.discount.paise(), 5_000);
        assert_eq!(bill.totals.grand_total.paise(), 61_976);
        assert!(bill.totals.is_consistent());
    }

    #[test]
    fn test_discount_equal_to_payable_is_allowed() {
        let bill = compute_totals(&[line("HC001", 1, 14_900, 1800)], Money::from_paise(17_582)).unwrap();
        assert_eq!(bill.totals.grand_total.paise(), 0);
    }

    #[test]
    fn test_discount_exceeding_payable_is_rejected() {
        // ₹300 + ₹36 tax, discount ₹500
        let err = compute_totals(&[line("ER010", 1, 30_000, 1200)], Money::from_rupees(500)).unwrap_err();
        assert!(matches!(err, ValidationError::DiscountExceedsPayable { .. }));
    }

    #[test]
    fn test_negative_discount_is_rejected() {
        let err = compute_totals(&[line("ER001", 1, 29_900, 1200)], Money::from_paise(-1)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_invalid_lines_are_rejected() {
        assert!(compute_totals(&[], Money::zero()).is_err());
        assert!(compute_totals(&[line("A1", 0, 100, 500)], Money::zero()).is_err());
        assert!(compute_totals(&[line("A1", -2, 100, 500)], Money::zero()).is_err());
        assert!(compute_totals(&[line("A1", 1, -100, 500)], Money::zero()).is_err());
        assert!(compute_totals(&[line("A1", 1, 100, 1000)], Money::zero()).is_err());
        assert!(compute_totals(&[line("", 1, 100, 500)], Money::zero()).is_err());

        // One bad line fails the whole bill
        let items = [line("A1", 1, 100, 500), line("A2", 1, 100, 1700)];
        assert!(compute_totals(&items, Money::zero()).is_err());
    }

    #[test]
    fn test_too_many_lines_are_rejected() {
        let items: Vec<_> = (0..=MAX_INVOICE_ITEMS)
            .map(|i| line(&format!("L{i}"), 1, 100, 0))
            .collect();
        assert!(matches!(
            compute_totals(&items, Money::zero()),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_oversized_totals_are_rejected() {
        // Line and subtotal fit, subtotal + 28% tax does not
        let err = compute_totals(&[line("GOLD1", 1, 8_000_000_000_000_000_000, 2800)], Money::zero())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        // Fits after tax but not once rounded up to the rupee
        let calc = TaxCalculator::new(GstSlabs::default(), RoundOffPolicy::NearestRupee);
        let err = calc
            .compute_totals(&[line("GOLD2", 1, i64::MAX, 0)], Money::zero())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        assert!(compute_totals(&[line("GOLD2", 1, i64::MAX, 0)], Money::zero()).is_ok());
    }

    #[test]
    fn test_custom_slabs() {
        let calc = TaxCalculator::with_slabs(GstSlabs::from_percentages(&[0.0, 3.0]));
        assert!(calc.compute_totals(&[line("G1", 1, 10_000, 300)], Money::zero()).is_ok());
        assert!(calc.compute_totals(&[line("G1", 1, 10_000, 1800)], Money::zero()).is_err());
    }

    #[test]
    fn test_rupee_round_off() {
        let calc = TaxCalculator::new(GstSlabs::default(), RoundOffPolicy::NearestRupee);

        let bill = calc.compute_totals(&[line("ER001", 2, 29_900, 1200)], Money::zero()).unwrap();
        assert_eq!(bill.totals.grand_total.paise(), 67_000);
        assert_eq!(bill.totals.round_off.paise(), 24);
        assert!(bill.totals.is_consistent());

        // ₹149 @18% = ₹175.82 → ₹176, then ₹249 @12% = ₹278.88 → ₹279
        let bill = calc.compute_totals(&[line("HC001", 1, 14_900, 1800)], Money::zero()).unwrap();
        assert_eq!(bill.totals.round_off.paise(), 18);

        let bill = calc
            .compute_totals(&[line("BR002", 1, 24_900, 1200)], Money::from_paise(40))
            .unwrap();
        // 278.88 - 0.40 = 278.48 → 278.00
        assert_eq!(bill.totals.grand_total.paise(), 27_800);
        assert_eq!(bill.totals.round_off.paise(), -48);
        assert!(bill.totals.is_consistent());
    }

    #[test]
    fn test_lines_are_snapshots_of_input() {
        let mut input = line("ER001", 1, 29_900, 1200);
        input.name = "  Crystal Drop Earrings ".to_string();
        let bill = compute_totals(&[input.clone()], Money::zero()).unwrap();

        assert_eq!(bill.items[0].name, "Crystal Drop Earrings");
        assert_eq!(bill.items[0].product_id, input.product_id);
        assert_eq!(bill.items[0].unit_price, input.unit_price);
        assert_eq!(bill.items[0].tax_rate, input.tax_rate);
    }
}

//! Property-based tests for the GST calculator and invoice sequencer.
//!
//! Run with: `cargo test -p fancy-core --test properties`

use fancy_core::gst::{compute_totals, TaxCalculator};
use fancy_core::sequence::InvoiceSequencer;
use fancy_core::{
    GstSlabs, LineItemInput, Money, RoundOffPolicy, SequenceError, TaxRate, ValidationError,
};
use proptest::prelude::*;

fn arb_rate() -> impl Strategy<Value = TaxRate> {
    prop_oneof![Just(0u32), Just(500), Just(1200), Just(1800), Just(2800)].prop_map(TaxRate::from_bps)
}

fn arb_line() -> impl Strategy<Value = LineItemInput> {
    (0i64..=5_000_000, 1i64..=999, arb_rate(), 1u32..=999).prop_map(|(price, quantity, tax_rate, n)| {
        LineItemInput {
            product_id: format!("p-{n}"),
            name: format!("Item {n}"),
            code: format!("IT{n:03}"),
            quantity,
            unit_price: Money::from_paise(price),
            tax_rate,
        }
    })
}

fn arb_lines() -> impl Strategy<Value = Vec<LineItemInput>> {
    prop::collection::vec(arb_line(), 1..=20)
}

proptest! {
    #[test]
    fn subtotal_is_exact_sum_of_lines(lines in arb_lines()) {
        let bill = compute_totals(&lines, Money::zero()).unwrap();
        let expected: i64 = lines.iter().map(|l| l.quantity * l.unit_price.paise()).sum();
        prop_assert_eq!(bill.totals.subtotal.paise(), expected);
    }

    #[test]
    fn tax_halves_always_sum_to_total(lines in arb_lines()) {
        let bill = compute_totals(&lines, Money::zero()).unwrap();
        let t = bill.totals;
        prop_assert_eq!(t.cgst + t.sgst, t.total_tax);
        prop_assert!((t.cgst - t.sgst).abs().paise() <= 1);
    }

    #[test]
    fn total_tax_is_within_half_paisa_of_exact(lines in arb_lines()) {
        let bill = compute_totals(&lines, Money::zero()).unwrap();
        // exact tax in units of 1/10000 paisa
        let exact: i128 = lines
            .iter()
            .map(|l| (l.quantity * l.unit_price.paise()) as i128 * l.tax_rate.bps() as i128)
            .sum();
        let diff = bill.totals.total_tax.paise() as i128 * 10_000 - exact;
        prop_assert!(diff.abs() <= 5_000);
    }

    #[test]
    fn grand_total_identity_holds(lines in arb_lines(), pct in 0u32..=100, rupee in any::<bool>()) {
        let policy = if rupee { RoundOffPolicy::NearestRupee } else { RoundOffPolicy::NearestPaisa };
        let calc = TaxCalculator::new(GstSlabs::default(), policy);

        let payable = compute_totals(&lines, Money::zero()).unwrap().totals.grand_total;
        let discount = Money::from_paise(payable.paise() * pct as i64 / 100);

        let t = calc.compute_totals(&lines, discount).unwrap().totals;
        prop_assert_eq!(t.subtotal + t.total_tax - t.discount + t.round_off, t.grand_total);
        prop_assert!(t.is_consistent());

        match policy {
            RoundOffPolicy::NearestPaisa => prop_assert!(t.round_off.is_zero()),
            RoundOffPolicy::NearestRupee => {
                prop_assert_eq!(t.grand_total.paise() % 100, 0);
                prop_assert!(t.round_off.abs().paise() <= 50);
            }
        }
    }

    #[test]
    fn compute_totals_is_deterministic(lines in arb_lines(), pct in 0u32..=100) {
        let payable = compute_totals(&lines, Money::zero()).unwrap().totals.grand_total;
        let discount = Money::from_paise(payable.paise() * pct as i64 / 100);

        for policy in [RoundOffPolicy::NearestPaisa, RoundOffPolicy::NearestRupee] {
            let calc = TaxCalculator::new(GstSlabs::default(), policy);
            let first = calc.compute_totals(&lines, discount).unwrap();
            let second = calc.compute_totals(&lines, discount).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn discount_above_payable_is_rejected(lines in arb_lines(), extra in 1i64..=100_000) {
        let payable = compute_totals(&lines, Money::zero()).unwrap().totals.grand_total;
        let result = compute_totals(&lines, payable + Money::from_paise(extra));
        let is_rejected = matches!(result, Err(ValidationError::DiscountExceedsPayable { .. }));
        prop_assert!(is_rejected);
    }

    #[test]
    fn sequence_is_strictly_increasing(start in 0u64..1_000_000) {
        let seq = InvoiceSequencer::default();
        let previous = seq.format_number(start);
        let next = seq.next_identifier(Some(&previous)).unwrap();

        prop_assert_eq!(seq.parse_number(&next).unwrap(), start + 1);
        prop_assert!(next.starts_with("FANCY"));
        prop_assert!(next.len() >= "FANCY0001".len());
    }

    #[test]
    fn sequence_never_accepts_foreign_prefix(n in 1u64..100_000) {
        let foreign = format!("SHOP{n:04}");
        let result = InvoiceSequencer::default().next_identifier(Some(&foreign));
        let is_mismatch = matches!(result, Err(SequenceError::PrefixMismatch { .. }));
        prop_assert!(is_mismatch);
    }
}

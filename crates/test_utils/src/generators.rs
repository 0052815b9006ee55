//! Property-based test data generators
//!
//! Proptest strategies for domain values. Amounts are generated at two
//! decimal places so totals assertions compare exact decimals.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::TaxRate;
use domain_billing::BillingInterval;

/// Strategy for monetary amounts in cents, up to one million
pub fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for signed amounts, covering correction scenarios
pub fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..=100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for quantities with up to three decimal places
pub fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|millis| Decimal::new(millis, 3))
}

/// Strategy for tax rates between 0% and 30%
pub fn tax_rate() -> impl Strategy<Value = TaxRate> {
    (0i64..=3000).prop_map(|basis_points| TaxRate::new(Decimal::new(basis_points, 4)))
}

/// Strategy for supported billing intervals
pub fn billing_interval() -> impl Strategy<Value = BillingInterval> {
    prop_oneof![
        Just(BillingInterval::Monthly),
        Just(BillingInterval::Quarterly),
        Just(BillingInterval::SemiAnnual),
        Just(BillingInterval::Annual),
    ]
}

/// Strategy for dates in the 2020s
pub fn date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2029, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::round_half_up;

    proptest! {
        #[test]
        fn generated_amounts_are_already_rounded(value in amount()) {
            prop_assert_eq!(round_half_up(value), value);
        }

        #[test]
        fn generated_rates_are_fractions(rate in tax_rate()) {
            let value = rate.as_decimal();
            prop_assert!(value >= Decimal::ZERO);
            prop_assert!(value <= Decimal::new(3, 1));
        }
    }
}

//! Cross-module tests for core_kernel

use chrono::{Datelike, NaiveDate};
use rust_decimal_macros::dec;

use core_kernel::{add_months_clamped, round_half_up, two_digit_year, TaxRate};

#[test]
fn stepwise_rounding_chain() {
    // 2.5 x 10.01 at 19%: each step rounds independently, HALF_UP.
    let net = round_half_up(dec!(2.5) * dec!(10.01));
    assert_eq!(net, dec!(25.03));

    let tax = TaxRate::new(dec!(0.19)).tax_on(net);
    assert_eq!(tax, dec!(4.76));

    let gross = round_half_up(net + tax);
    assert_eq!(gross, dec!(29.79));
}

#[test]
fn stepwise_rounding_differs_from_end_to_end_rounding() {
    // Rounding once at the end would give 29.78; the engine must not do that.
    let end_to_end = round_half_up(dec!(2.5) * dec!(10.01) * dec!(1.19));
    assert_eq!(end_to_end, dec!(29.78));
}

#[test]
fn monthly_advance_through_a_year_stays_on_first() {
    let mut date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    for _ in 0..12 {
        date = add_months_clamped(date, 1);
        assert_eq!(date.day(), 1);
    }
    assert_eq!(date, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    assert_eq!(two_digit_year(date), 27);
}

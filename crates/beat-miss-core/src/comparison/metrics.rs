//! Metric comparator.
//!
//! Amounts (sales, EBITDA, PAT) are compared as a ratio expressed in
//! percent; margins are compared as a spread expressed in basis points.
//! Every function returns `None` instead of failing when an input is
//! missing or a denominator is zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Bps, Money, Percent};

const HUNDRED: Decimal = dec!(100);

/// `(actual / expected - 1) * 100`.
///
/// Absent when either side is absent or `expected` is zero. Zero means an
/// exact match, positive means the actual figure exceeds the expectation.
pub fn percent_difference(actual: Option<Money>, expected: Option<Money>) -> Option<Percent> {
    let (actual, expected) = (actual?, expected?);
    if expected.is_zero() {
        return None;
    }
    actual
        .checked_div(expected)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .and_then(|excess| excess.checked_mul(HUNDRED))
}

/// `(actual_margin_pct - expected_margin_pct) * 100`, in basis points.
pub fn margin_difference_bps(
    actual_margin_pct: Option<Percent>,
    expected_margin_pct: Option<Percent>,
) -> Option<Bps> {
    let (actual, expected) = (actual_margin_pct?, expected_margin_pct?);
    actual
        .checked_sub(expected)
        .and_then(|spread| spread.checked_mul(HUNDRED))
}

/// `ebitda / sales * 100`, for rows where the margin has to be derived.
pub fn implied_margin(ebitda: Option<Money>, sales: Option<Money>) -> Option<Percent> {
    let (ebitda, sales) = (ebitda?, sales?);
    if sales.is_zero() {
        return None;
    }
    ebitda
        .checked_div(sales)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_difference_beat() {
        assert_eq!(
            percent_difference(Some(dec!(100)), Some(dec!(80))),
            Some(dec!(25))
        );
    }

    #[test]
    fn test_percent_difference_miss() {
        assert_eq!(
            percent_difference(Some(dec!(80)), Some(dec!(100))),
            Some(dec!(-20))
        );
    }

    #[test]
    fn test_percent_difference_exact_match_is_zero() {
        assert_eq!(
            percent_difference(Some(dec!(512.5)), Some(dec!(512.5))),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_percent_difference_zero_expected_is_absent() {
        assert_eq!(percent_difference(Some(dec!(100)), Some(dec!(0))), None);
        assert_eq!(percent_difference(Some(dec!(0)), Some(dec!(0))), None);
    }

    #[test]
    fn test_percent_difference_missing_inputs() {
        assert_eq!(percent_difference(None, Some(dec!(100))), None);
        assert_eq!(percent_difference(Some(dec!(100)), None), None);
    }

    #[test]
    fn test_percent_difference_negative_expected_keeps_ratio_semantics() {
        // A loss expected, a smaller loss reported: ratio 0.5 => -50%
        assert_eq!(
            percent_difference(Some(dec!(-10)), Some(dec!(-20))),
            Some(dec!(-50))
        );
    }

    #[test]
    fn test_percent_difference_overflow_is_absent() {
        assert_eq!(percent_difference(Some(Decimal::MIN), Some(Decimal::ONE)), None);
        assert_eq!(percent_difference(Some(Decimal::MAX), Some(Decimal::ONE)), None);
        assert_eq!(
            margin_difference_bps(Some(Decimal::MAX), Some(Decimal::MIN)),
            None
        );
    }

    #[test]
    fn test_margin_difference_bps() {
        assert_eq!(
            margin_difference_bps(Some(dec!(12.5)), Some(dec!(10.0))),
            Some(dec!(250))
        );
        assert_eq!(
            margin_difference_bps(Some(dec!(10.0)), Some(dec!(12.5))),
            Some(dec!(-250))
        );
    }

    #[test]
    fn test_margin_difference_near_zero_margins() {
        // 0.1% vs 0.05% is a 5 bps gap, not a 100% beat
        assert_eq!(
            margin_difference_bps(Some(dec!(0.1)), Some(dec!(0.05))),
            Some(dec!(5))
        );
    }

    #[test]
    fn test_margin_difference_missing_side() {
        assert_eq!(margin_difference_bps(None, Some(dec!(10))), None);
        assert_eq!(margin_difference_bps(Some(dec!(10)), None), None);
    }

    #[test]
    fn test_implied_margin() {
        assert_eq!(
            implied_margin(Some(dec!(200)), Some(dec!(1000))),
            Some(dec!(20))
        );
        assert_eq!(implied_margin(Some(dec!(200)), None), None);
        assert_eq!(implied_margin(None, Some(dec!(1000))), None);
        assert_eq!(implied_margin(Some(dec!(200)), Some(dec!(0))), None);
    }
}

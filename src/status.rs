//! Measurement status classification
//!
//! Pure function from a raw value and an optimal range to a severity tier and
//! deviation magnitude. No I/O, no side effects; recomputed on every read.

use crate::types::{Direction, StatusResult, Tier};

/// Deviation below this percentage is still `Normal`.
pub const WARNING_THRESHOLD_PCT: f64 = 10.0;

/// Deviation at or above this percentage is `Critical`.
pub const CRITICAL_THRESHOLD_PCT: f64 = 20.0;

/// Classify a measurement value against its optimal range.
///
/// Deviation is expressed as a percentage of the violated bound:
/// `(min - v) / min * 100` below the range, `(v - max) / max * 100` above it,
/// and exactly `0` anywhere inside the range (both bounds inclusive).
///
/// Tier boundaries are half-open: a deviation of exactly 10.0% is `Warning`
/// and exactly 20.0% is `Critical`.
///
/// Never fails. `None` input yields `NoData` with no deviation. Precondition:
/// `optimal_min > 0` — the below-range division is degenerate otherwise, and
/// reference data is rejected at the boundary by
/// [`OptimalRange::validate`](crate::types::OptimalRange::validate) before it
/// can reach this function.
/// NaN or negative values are not special-cased; they flow through the same
/// arithmetic.
pub fn classify(current_value: Option<f64>, optimal_min: f64, optimal_max: f64) -> StatusResult {
    let value = match current_value {
        Some(v) => v,
        None => {
            return StatusResult {
                tier: Tier::NoData,
                deviation_pct: None,
            }
        }
    };

    let deviation_pct = if value < optimal_min {
        (optimal_min - value) / optimal_min * 100.0
    } else if value > optimal_max {
        (value - optimal_max) / optimal_max * 100.0
    } else {
        0.0
    };

    let tier = if deviation_pct < WARNING_THRESHOLD_PCT {
        Tier::Normal
    } else if deviation_pct < CRITICAL_THRESHOLD_PCT {
        Tier::Warning
    } else {
        Tier::Critical
    };

    StatusResult {
        tier,
        deviation_pct: Some(deviation_pct),
    }
}

/// Which side of the range a value sits on, for out-of-range values only.
///
/// Returns `None` when the value is inside the range (inclusive).
pub fn deviation_direction(value: f64, optimal_min: f64, optimal_max: f64) -> Option<Direction> {
    if value < optimal_min {
        Some(Direction::Below)
    } else if value > optimal_max {
        Some(Direction::Above)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_no_data() {
        let result = classify(None, 6.5, 7.5);
        assert_eq!(result.tier, Tier::NoData);
        assert_eq!(result.deviation_pct, None);
    }

    #[test]
    fn test_within_range_is_normal_with_zero_deviation() {
        let result = classify(Some(7.0), 6.5, 7.5);
        assert_eq!(result.tier, Tier::Normal);
        assert_eq!(result.deviation_pct, Some(0.0));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(classify(Some(6.5), 6.5, 7.5).deviation_pct, Some(0.0));
        assert_eq!(classify(Some(7.5), 6.5, 7.5).deviation_pct, Some(0.0));
    }

    #[test]
    fn test_below_range_deviation_formula() {
        // (1.0 - 0.95) / 1.0 * 100 = 5%
        let result = classify(Some(0.95), 1.0, 1.1);
        assert_eq!(result.tier, Tier::Normal);
        assert!((result.deviation_pct.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_above_range_deviation_formula() {
        // (8.5 - 8.3) / 8.3 * 100 ~= 2.41%
        let result = classify(Some(8.5), 7.8, 8.3);
        assert_eq!(result.tier, Tier::Normal);
        assert!((result.deviation_pct.unwrap() - 2.4096385542168677).abs() < 1e-9);
    }

    #[test]
    fn test_exact_ten_percent_is_warning() {
        // (1.0 - 0.9) / 1.0 * 100 = 10.0 exactly
        let result = classify(Some(0.9), 1.0, 1.1);
        assert_eq!(result.tier, Tier::Warning);
        assert!((result.deviation_pct.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_twenty_percent_is_critical() {
        // (1.0 - 0.8) / 1.0 * 100 = 20.0 exactly
        let result = classify(Some(0.8), 1.0, 1.1);
        assert_eq!(result.tier, Tier::Critical);
        assert!((result.deviation_pct.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_critical_below() {
        // (1.0 - 0.75) / 1.0 * 100 = 25%
        let result = classify(Some(0.75), 1.0, 1.1);
        assert_eq!(result.tier, Tier::Critical);
        assert!((result.deviation_pct.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction() {
        assert_eq!(deviation_direction(0.5, 1.0, 1.1), Some(Direction::Below));
        assert_eq!(deviation_direction(1.5, 1.0, 1.1), Some(Direction::Above));
        assert_eq!(deviation_direction(1.05, 1.0, 1.1), None);
        assert_eq!(deviation_direction(1.0, 1.0, 1.1), None);
    }

    #[quickcheck]
    fn prop_below_range_deviation_monotonic(a: u16, b: u16) -> bool {
        // Two distinct values below min = 100.0; the lower one must deviate more.
        let min = 100.0;
        let lo = f64::from(a.min(b)) / 1000.0;
        let hi = f64::from(a.max(b)) / 1000.0;
        if (hi - lo).abs() < f64::EPSILON {
            return true;
        }
        let d_lo = classify(Some(lo), min, 200.0).deviation_pct.unwrap();
        let d_hi = classify(Some(hi), min, 200.0).deviation_pct.unwrap();
        d_lo > d_hi
    }

    #[quickcheck]
    fn prop_deviation_never_negative(v: f64) -> bool {
        if !v.is_finite() {
            return true;
        }
        let d = classify(Some(v.abs()), 1.0, 2.0).deviation_pct.unwrap();
        d >= 0.0
    }
}

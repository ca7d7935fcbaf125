//! Stateless analytic primitives used by the rolling calculators.
//!
//! These are pure functions over plain numbers and slices, composed with
//! the windowing strategies in `windows`.

use crate::time_series::is_usable_value;
use ordered_float::OrderedFloat;

/// Compound annual growth rate between two index levels `years` apart.
///
/// Returns `None` when either level is non-positive or non-finite, when
/// `years` is not positive, or when the result is not finite. A fractional
/// power of a non-positive base has no real value.
pub fn cagr(start: f64, end: f64, years: f64) -> Option<f64> {
    if !is_usable_value(start) || !is_usable_value(end) {
        return None;
    }
    if !(years.is_finite() && years > 0.0) {
        return None;
    }

    let value = (end / start).powf(1.0 / years) - 1.0;
    value.is_finite().then_some(value)
}

/// Percentile rank of `value` inside an ascending `sorted` window.
///
/// Tied members share the average of their 1-based rank positions; the
/// average rank is then rescaled so the window minimum maps to `0.0` and
/// the maximum to `1.0`: `(avg_rank - 1) / (len - 1)`. A window whose
/// members are all equal (including a single-member window) yields `0.5`.
/// Values differ from a pandas `rank(pct=True)` reference (`avg_rank / len`)
/// by `O(1/len)`, so a comparison against one reports close, not exact.
///
/// Returns `None` if the window is empty or `value` is not a member.
pub fn average_rank_percentile(sorted: &[OrderedFloat<f64>], value: f64) -> Option<f64> {
    let len = sorted.len();
    if len == 0 {
        return None;
    }

    let key = OrderedFloat(value);
    let lower = sorted.partition_point(|v| *v < key);
    let upper = sorted.partition_point(|v| *v <= key);
    if upper == lower {
        return None;
    }
    if len == 1 {
        return Some(0.5);
    }

    let avg_rank = (lower + 1 + upper) as f64 * 0.5;
    Some((avg_rank - 1.0) / (len as f64 - 1.0))
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1].0 + sorted[mid].0) / 2.0)
    } else {
        Some(sorted[mid].0)
    }
}

/// Rounds to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[f64]) -> Vec<OrderedFloat<f64>> {
        let mut out: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
        out.sort();
        out
    }

    #[test]
    fn cagr_matches_worked_example() {
        // 12000 -> 19500 over five years is roughly 10.2% a year.
        let value = cagr(12000.0, 19500.0, 5.0).unwrap();
        assert!((value - (1.625_f64.powf(0.2) - 1.0)).abs() < 1e-12);
        assert!((value - 0.1020).abs() < 1e-3);
    }

    #[test]
    fn cagr_of_doubling() {
        let value = cagr(100.0, 200.0, 5.0).unwrap();
        assert!((value - (2.0_f64.powf(0.2) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn cagr_rejects_non_positive_levels() {
        assert_eq!(cagr(0.0, 100.0, 5.0), None);
        assert_eq!(cagr(100.0, -1.0, 5.0), None);
        assert_eq!(cagr(f64::NAN, 100.0, 5.0), None);
        assert_eq!(cagr(100.0, 110.0, 0.0), None);
    }

    #[test]
    fn rank_of_window_maximum_is_one() {
        let window = sorted(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(average_rank_percentile(&window, 4.0), Some(1.0));
    }

    #[test]
    fn rank_of_window_minimum_is_zero() {
        let window = sorted(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(average_rank_percentile(&window, 1.0), Some(0.0));
    }

    #[test]
    fn rank_of_all_ties_is_midpoint() {
        let window = sorted(&[0.07; 5]);
        assert_eq!(average_rank_percentile(&window, 0.07), Some(0.5));
        assert_eq!(average_rank_percentile(&sorted(&[3.0]), 3.0), Some(0.5));
    }

    #[test]
    fn rank_with_partial_ties_averages_positions() {
        // Ranks: 1, 2.5, 2.5, 4 -> (2.5 - 1) / 3
        let window = sorted(&[1.0, 2.0, 2.0, 3.0]);
        let value = average_rank_percentile(&window, 2.0).unwrap();
        assert!((value - 0.5).abs() < 1e-12);

        let window = sorted(&[1.0, 2.0, 3.0, 3.0, 5.0]);
        let value = average_rank_percentile(&window, 3.0).unwrap();
        assert!((value - 2.5 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn rank_stays_within_one_over_len_of_pct_rank() {
        let values: Vec<f64> = (0..20).map(|i| ((i * 7) % 11) as f64).collect();
        let window = sorted(&values);
        let len = window.len() as f64;
        for &value in &values {
            let lower = window.partition_point(|v| v.0 < value);
            let upper = window.partition_point(|v| v.0 <= value);
            let pct_rank = (lower + 1 + upper) as f64 * 0.5 / len;
            let ours = average_rank_percentile(&window, value).unwrap();
            assert!((ours - pct_rank).abs() <= 1.0 / len + 1e-12);
        }
    }

    #[test]
    fn rank_requires_membership() {
        assert_eq!(average_rank_percentile(&[], 1.0), None);
        assert_eq!(average_rank_percentile(&sorted(&[1.0, 2.0]), 1.5), None);
    }

    #[test]
    fn mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[0.25, 0.75]), Some(0.5));
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[0.9, 0.1, 0.5]), Some(0.5));
        assert_eq!(median(&[0.4, 0.1, 0.2, 0.3]), Some(0.25));
    }

    #[test]
    fn round_to_six_places() {
        assert_eq!(round_to(0.73421987, 6), 0.73422);
        assert_eq!(round_to(0.5, 6), 0.5);
    }
}

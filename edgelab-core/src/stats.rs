//! Shared statistics helpers: pure functions over `f64` slices.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Zero for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile of an ascending-sorted slice using linear interpolation
/// between closest ranks. `p` is in percent (0-100); rank is `p/100 * (n-1)`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    // Clamped so tied neighbours return the tie exactly.
    (a + (b - a) * frac).max(a).min(b)
}

/// Sort a copy ascending with a total order (NaN last).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Maximum peak-to-trough drawdown of a balance series, as a positive
/// percentage of the running peak. Zero for flat or rising series.
pub fn max_drawdown_pct(balances: &[f64]) -> f64 {
    let Some(&first) = balances.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &b in balances {
        if b > peak {
            peak = b;
        }
        if peak > 0.0 {
            let dd = (peak - b) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn std_dev_is_population() {
        // Population std of [2,4,4,4,5,5,7,9] is exactly 2.
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&v) - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[3.0]), 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let v = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile_sorted(&v, 0.0), 10.0);
        assert_eq!(percentile_sorted(&v, 50.0), 30.0);
        assert_eq!(percentile_sorted(&v, 100.0), 50.0);
        // rank = 0.25 * 4 = 1.0 -> 20; rank 0.1*4 = 0.4 -> 14
        assert!((percentile_sorted(&v, 25.0) - 20.0).abs() < 1e-12);
        assert!((percentile_sorted(&v, 10.0) - 14.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_is_monotonic_over_ties() {
        let low = 29.49139936864199_f64;
        let high = 29.491399368641993_f64;
        let mut v = vec![low; 57];
        v.extend([high; 3]);
        let p5 = percentile_sorted(&v, 5.0);
        let p25 = percentile_sorted(&v, 25.0);
        assert_eq!(p5, low);
        assert_eq!(p25, low);
        assert_eq!(percentile_sorted(&v, 100.0), high);

        let mut prev = f64::NEG_INFINITY;
        for p in 0..=100 {
            let value = percentile_sorted(&v, p as f64);
            assert!(value >= prev, "p{p} = {value} fell below {prev}");
            prev = value;
        }
    }

    #[test]
    fn percentile_degenerate_inputs() {
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
        assert_eq!(percentile_sorted(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn max_drawdown_known() {
        // Peak 110, trough 90 -> 18.18%
        let dd = max_drawdown_pct(&[100.0, 110.0, 90.0, 95.0]);
        assert!((dd - 20.0 / 110.0 * 100.0).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        let eq: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        assert_eq!(max_drawdown_pct(&eq), 0.0);
        assert_eq!(max_drawdown_pct(&[]), 0.0);
    }
}

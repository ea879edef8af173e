//! Percentile reduction of sample populations.

/// A (low, median, high) percentile triple summarizing one sample population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Value at the low percentile.
    pub low: f64,
    /// Value at the median percentile.
    pub med: f64,
    /// Value at the high percentile.
    pub high: f64,
}

/// Returns the `p`-th percentile of `samples` (linear interpolation between
/// closest ranks).
///
/// # Arguments
///
/// * `samples` - Sample population (not required to be sorted)
/// * `p` - Percentile in `[0, 100]`
///
/// # Panics
///
/// Panics if `samples` is empty.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    assert!(!samples.is_empty(), "percentile of empty population");
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    rank_value(&sorted, p)
}

/// Reduces one population to a percentile band, sorting only once.
///
/// # Arguments
///
/// * `samples` - Sample population (not required to be sorted)
/// * `pct` - Ascending percentile triple, e.g. `[2.5, 50.0, 97.5]`
///
/// # Panics
///
/// Panics if `samples` is empty.
pub fn band(samples: &[f64], pct: [f64; 3]) -> Band {
    assert!(!samples.is_empty(), "percentile of empty population");
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Band {
        low: rank_value(&sorted, pct[0]),
        med: rank_value(&sorted, pct[1]),
        high: rank_value(&sorted, pct[2]),
    }
}

/// Order statistic over an already-sorted slice.
fn rank_value(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    #[test]
    fn endpoints_are_min_and_max() {
        let v = vec![3.0, 1.0, 2.0, 5.0, 4.0];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 100.0), 5.0);
    }

    #[test]
    fn median_of_odd_population() {
        let v = vec![9.0, 1.0, 5.0];
        assert_eq!(percentile(&v, 50.0), 5.0);
    }

    #[test]
    fn median_interpolates_between_ranks() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 50.0), 2.5);
    }

    #[test]
    fn quarter_percentile_interpolates() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        // rank = 0.25 * 4 = 1.0 exactly
        assert_eq!(percentile(&v, 25.0), 2.0);
        // rank = 0.10 * 4 = 0.4 -> 1.0 + 0.4 * (2.0 - 1.0)
        assert!((percentile(&v, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn band_matches_individual_percentiles() {
        let v: Vec<f64> = (0..101).map(|i| i as f64).collect();
        let b = band(&v, [2.5, 50.0, 97.5]);
        assert_eq!(b.low, percentile(&v, 2.5));
        assert_eq!(b.med, percentile(&v, 50.0));
        assert_eq!(b.high, percentile(&v, 97.5));
        assert_eq!(b.med, 50.0);
    }

    #[test]
    fn single_sample_population_is_constant() {
        let v = vec![7.25];
        let b = band(&v, [2.5, 50.0, 97.5]);
        assert_eq!(b.low, 7.25);
        assert_eq!(b.med, 7.25);
        assert_eq!(b.high, 7.25);
    }

    #[test]
    #[should_panic]
    fn empty_population_panics() {
        percentile(&[], 50.0);
    }

    #[test]
    fn converges_to_analytic_normal_quantiles() {
        // 20000 draws from Normal(10, 2): 2.5/50/97.5 percentiles should land
        // near 10 - 1.96*2, 10, 10 + 1.96*2 within sampling tolerance.
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(10.0, 2.0).expect("valid parameters");
        let samples: Vec<f64> = (0..20_000).map(|_| normal.sample(&mut rng)).collect();
        let b = band(&samples, [2.5, 50.0, 97.5]);
        assert!((b.med - 10.0).abs() < 0.1, "median {}", b.med);
        assert!((b.low - (10.0 - 1.96 * 2.0)).abs() < 0.2, "low {}", b.low);
        assert!((b.high - (10.0 + 1.96 * 2.0)).abs() < 0.2, "high {}", b.high);
    }
}

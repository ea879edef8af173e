//! Tiered solar generation sampling from 10/50/90 percentile estimates.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Triangular};
use serde::Serialize;

/// Forecaster-supplied generation estimate for one time step.
///
/// The three values are interpreted as the 10th, 50th, and 90th percentile of
/// expected generation for the step, already scaled to the step's energy
/// duration (kWh). Asymmetric bands are respected: sampling pipes a random
/// variate through a four-segment piecewise-linear inverse CDF anchored at
/// the three estimates, so the population's empirical 10/50/90 percentiles
/// track the inputs while the upper tail stays open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarEstimate {
    /// 10th percentile generation estimate (kWh, >= 0).
    pub low: f64,
    /// Median generation estimate (kWh, >= 0).
    pub med: f64,
    /// 90th percentile generation estimate (kWh, >= 0).
    pub high: f64,
}

impl SolarEstimate {
    /// Creates an estimate from the (low, med, high) percentile triple.
    pub fn new(low: f64, med: f64, high: f64) -> Self {
        Self { low, med, high }
    }

    /// Evaluates the piecewise-linear inverse CDF at variate `u ∈ [0, 1]`.
    ///
    /// Segments: a ramp from zero up to `low` over `u < 0.1`, linear
    /// interpolation `low..med` over `0.1..0.5` and `med..high` over
    /// `0.5..0.9`, then linear extrapolation beyond `high` for `u >= 0.9`
    /// (unbounded upside).
    pub fn quantile(&self, u: f64) -> f64 {
        if u < 0.10 {
            self.low * u / 0.10
        } else if u < 0.50 {
            self.low + (self.med - self.low) * (u - 0.10) / 0.40
        } else if u < 0.90 {
            self.med + (self.high - self.med) * (u - 0.50) / 0.40
        } else {
            self.high * (1.0 + (u - 0.90) / 0.10)
        }
    }

    /// Draws `n` independent generation samples, clamped non-negative.
    ///
    /// Variates come from `Triangular(0, 1, mode 0.5)`, concentrating mass
    /// near the median estimate.
    pub fn sample_population(&self, rng: &mut StdRng, n: usize) -> Vec<f64> {
        let variate = Triangular::new(0.0, 1.0, 0.5).expect("constant parameters are valid");
        (0..n)
            .map(|_| self.quantile(variate.sample(rng)).max(0.0))
            .collect()
    }
}

//! Per-time-of-day consumption distribution fitted from the history table.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::history::ConsumptionHistory;

/// Fitted distribution parameters for one time-of-day slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotStats {
    /// Sample mean of the historical increments (kWh).
    pub mean: f64,
    /// Population standard deviation of the historical increments (kWh).
    pub std_dev: f64,
    /// Number of historical values the fit is based on.
    pub count: usize,
}

/// Empirical incremental-consumption model, one Normal fit per
/// time-of-day slot.
///
/// A slot backed by a single historical value degenerates to a constant
/// draw (its population standard deviation is zero); an empty slot yields
/// no entry and is rejected by the engine before simulation starts.
#[derive(Debug, Clone)]
pub struct ConsumptionProfile {
    slots: BTreeMap<NaiveTime, SlotStats>,
}

impl ConsumptionProfile {
    /// Fits per-slot statistics over the history table, discarding
    /// non-finite entries.
    pub fn fit(history: &ConsumptionHistory) -> Self {
        let mut slots = BTreeMap::new();
        for &slot in history.slots() {
            let Some(values) = history.increments_at(slot) else {
                continue;
            };
            let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            if finite.is_empty() {
                continue;
            }
            let n = finite.len() as f64;
            let mean = finite.iter().sum::<f64>() / n;
            let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            slots.insert(
                slot,
                SlotStats {
                    mean,
                    std_dev: variance.sqrt(),
                    count: finite.len(),
                },
            );
        }
        Self { slots }
    }

    /// Builds a profile directly from per-slot statistics (synthetic
    /// profiles and tests).
    pub fn from_slots(slots: BTreeMap<NaiveTime, SlotStats>) -> Self {
        Self { slots }
    }

    /// Fitted statistics for one time-of-day slot, if any history backs it.
    pub fn stats(&self, time_of_day: NaiveTime) -> Option<&SlotStats> {
        self.slots.get(&time_of_day)
    }

    /// Draws `n` incremental-consumption samples for one slot, clamped
    /// non-negative.
    pub fn sample_population(stats: &SlotStats, rng: &mut StdRng, n: usize) -> Vec<f64> {
        if stats.std_dev > 0.0 {
            let normal =
                Normal::new(stats.mean, stats.std_dev).expect("finite parameters checked upstream");
            (0..n).map(|_| normal.sample(rng).max(0.0)).collect()
        } else {
            vec![stats.mean.max(0.0); n]
        }
    }
}

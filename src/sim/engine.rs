//! Monte Carlo driver propagating sample populations through the horizon.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use rand::{SeedableRng, rngs::StdRng};

use crate::models::{ConsumptionProfile, SlotStats};

use super::battery::{BatteryParams, StepFlows, advance_soc, step_flows};
use super::percentile::{band, percentile};
use super::types::{DailyAggregates, ForecastRecord, ForecastStep, SimConfig, SimError, round2};

/// Complete output of one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRun {
    /// One record per forecast step, chronological.
    pub records: Vec<ForecastRecord>,
    /// Ten today/tomorrow flow medians.
    pub daily: DailyAggregates,
}

/// Running element-wise sums of the five flow populations for one day.
///
/// Accumulators are explicit structs threaded through the loop so the
/// driver stays pure with respect to its caller.
struct DailyAccumulator {
    charge: Vec<f64>,
    export: Vec<f64>,
    self_consumption: Vec<f64>,
    discharge: Vec<f64>,
    import: Vec<f64>,
}

impl DailyAccumulator {
    fn zeroed(n: usize) -> Self {
        Self {
            charge: vec![0.0; n],
            export: vec![0.0; n],
            self_consumption: vec![0.0; n],
            discharge: vec![0.0; n],
            import: vec![0.0; n],
        }
    }

    fn add(&mut self, flows: &StepFlows) {
        add_assign(&mut self.charge, &flows.charge);
        add_assign(&mut self.export, &flows.export);
        add_assign(&mut self.self_consumption, &flows.self_consumption);
        add_assign(&mut self.discharge, &flows.discharge);
        add_assign(&mut self.import, &flows.import);
    }

    /// Medians of the five accumulated populations:
    /// (charge, export, self-consumption, discharge, import).
    fn medians(&self) -> (f64, f64, f64, f64, f64) {
        (
            round2(percentile(&self.charge, 50.0)),
            round2(percentile(&self.export, 50.0)),
            round2(percentile(&self.self_consumption, 50.0)),
            round2(percentile(&self.discharge, 50.0)),
            round2(percentile(&self.import, 50.0)),
        )
    }
}

fn add_assign(acc: &mut [f64], values: &[f64]) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}

/// Monte Carlo forecast engine owning the horizon, fitted models, battery
/// scalars, and seeded RNG for one run.
///
/// Construction performs all input and configuration validation; a
/// constructed engine cannot emit partial output.
#[derive(Debug)]
pub struct Engine {
    config: SimConfig,
    steps: Vec<ForecastStep>,
    /// Per-step consumption statistics, resolved during construction.
    slot_stats: Vec<SlotStats>,
    battery: BatteryParams,
    now: DateTime<Tz>,
    rng: StdRng,
}

impl Engine {
    /// Creates a forecast engine after validating every input.
    ///
    /// # Arguments
    ///
    /// * `config` - Sample count, percentile triple, and seed
    /// * `steps` - Forecast horizon, strictly chronological
    /// * `profile` - Fitted per-time-of-day consumption model
    /// * `battery` - Observed state of charge and capacity (kWh)
    /// * `now` - Evaluation instant; steps before it are treated as history
    ///
    /// # Errors
    ///
    /// Returns a `SimError` for an empty or unordered horizon, a step with
    /// no (or non-finite) consumption history, impossible battery scalars,
    /// a sample count below 2, or a malformed percentile triple.
    pub fn new(
        config: SimConfig,
        steps: Vec<ForecastStep>,
        profile: &ConsumptionProfile,
        battery: BatteryParams,
        now: DateTime<Tz>,
    ) -> Result<Self, SimError> {
        if config.n_samples <= 1 {
            return Err(SimError::SampleCount {
                n_samples: config.n_samples,
            });
        }
        let pct = config.percentiles;
        let ascending = pct[0] < pct[1] && pct[1] < pct[2];
        if !ascending || pct[0] < 0.0 || pct[2] > 100.0 || pct.iter().any(|p| !p.is_finite()) {
            return Err(SimError::Percentiles { requested: pct });
        }

        if steps.is_empty() {
            return Err(SimError::EmptyForecast);
        }
        for i in 1..steps.len() {
            if steps[i].start <= steps[i - 1].start {
                return Err(SimError::UnorderedForecast { index: i });
            }
        }

        let soc_ok = battery.soc_kwh.is_finite() && battery.soc_kwh >= 0.0;
        let cap_ok = battery.capacity_kwh.is_finite()
            && battery.capacity_kwh >= 0.0
            && !(battery.capacity_kwh == 0.0 && battery.soc_kwh > 0.0);
        if !soc_ok || !cap_ok {
            return Err(SimError::InvalidBattery {
                soc_kwh: battery.soc_kwh,
                capacity_kwh: battery.capacity_kwh,
            });
        }

        let mut slot_stats = Vec::with_capacity(steps.len());
        for step in &steps {
            let time_of_day = step.time_of_day();
            let stats = profile
                .stats(time_of_day)
                .ok_or(SimError::MissingProfile { time_of_day })?;
            if !stats.mean.is_finite() || !stats.std_dev.is_finite() {
                return Err(SimError::DegenerateProfile { time_of_day });
            }
            slot_stats.push(*stats);
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            steps,
            slot_stats,
            battery,
            now,
            rng,
        })
    }

    /// Runs the Monte Carlo propagation over the whole horizon.
    ///
    /// Steps are processed strictly sequentially: each step's battery-state
    /// population is the previous step's output (a Markov chain over sample
    /// vectors), so the loop must never be parallelized or reordered.
    pub fn run(&mut self) -> ForecastRun {
        let n = self.config.n_samples;
        let pct = self.config.percentiles;
        let capacity = self.battery.capacity_kwh;
        // Capacity-bounded broadcast of the observed state of charge; also
        // the held value for steps before "now".
        let initial_soc = self.battery.soc_kwh.min(capacity);

        let mut soc_now = vec![initial_soc; n];
        let mut cum_consumption = vec![0.0; n];
        let mut cum_solar = vec![0.0; n];
        let mut today = DailyAccumulator::zeroed(n);
        let mut tomorrow = DailyAccumulator::zeroed(n);

        let today_date = self.now.date_naive();
        let tomorrow_date = (self.now + Duration::days(1)).date_naive();

        let mut records = Vec::with_capacity(self.steps.len());
        for (step, stats) in self.steps.iter().zip(&self.slot_stats) {
            let consumption = ConsumptionProfile::sample_population(stats, &mut self.rng, n);
            let solar = step.solar.sample_population(&mut self.rng, n);

            add_assign(&mut cum_consumption, &consumption);
            add_assign(&mut cum_solar, &solar);

            let net: Vec<f64> = solar
                .iter()
                .zip(&consumption)
                .map(|(&s, &e)| s - e)
                .collect();

            let forward = step.start >= self.now;
            if forward {
                let date = step.start.date_naive();
                if date == today_date {
                    today.add(&step_flows(&solar, &consumption, &soc_now, capacity));
                } else if date == tomorrow_date {
                    tomorrow.add(&step_flows(&solar, &consumption, &soc_now, capacity));
                }
            }

            // Past steps are historical fact: hold the observed charge.
            let next_soc = if forward {
                advance_soc(&soc_now, &net, capacity)
            } else {
                vec![initial_soc; n]
            };

            records.push(ForecastRecord::from_bands(
                step.start,
                band(&net, pct),
                band(&solar, pct),
                band(&consumption, pct),
                band(&next_soc, pct),
                band(&cum_consumption, pct),
                band(&cum_solar, pct),
            ));

            soc_now = next_soc;
        }

        let (today_charge, today_export, today_consumed, today_discharge, today_import) =
            today.medians();
        let (
            tomorrow_charge,
            tomorrow_export,
            tomorrow_consumed,
            tomorrow_discharge,
            tomorrow_import,
        ) = tomorrow.medians();

        ForecastRun {
            records,
            daily: DailyAggregates {
                today_charge,
                today_export,
                today_consumed,
                today_discharge,
                today_import,
                tomorrow_charge,
                tomorrow_export,
                tomorrow_consumed,
                tomorrow_discharge,
                tomorrow_import,
            },
        }
    }

    /// Returns the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the battery scalars.
    pub fn battery(&self) -> &BatteryParams {
        &self.battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SolarEstimate;
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::Tz;
    use std::collections::BTreeMap;

    fn tz() -> Tz {
        "Europe/Amsterdam".parse().expect("valid timezone")
    }

    /// Profile with one constant 0.4 kWh slot per half hour of the day.
    fn flat_profile() -> ConsumptionProfile {
        let mut slots = BTreeMap::new();
        for i in 0..48 {
            let t = NaiveTime::from_num_seconds_from_midnight_opt(i * 1800, 0).unwrap();
            slots.insert(
                t,
                SlotStats {
                    mean: 0.4,
                    std_dev: 0.0,
                    count: 1,
                },
            );
        }
        ConsumptionProfile::from_slots(slots)
    }

    fn steps_from(hour: u32, count: usize, solar: SolarEstimate) -> Vec<ForecastStep> {
        let base = tz().with_ymd_and_hms(2026, 8, 28, hour, 0, 0).unwrap();
        (0..count)
            .map(|i| ForecastStep {
                start: base + Duration::minutes(30 * i as i64),
                solar,
            })
            .collect()
    }

    fn battery() -> BatteryParams {
        BatteryParams {
            soc_kwh: 5.0,
            capacity_kwh: 10.0,
        }
    }

    #[test]
    fn rejects_empty_horizon() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let err = Engine::new(
            SimConfig::new(100, 1),
            Vec::new(),
            &flat_profile(),
            battery(),
            now,
        )
        .unwrap_err();
        assert_eq!(err, SimError::EmptyForecast);
    }

    #[test]
    fn rejects_unordered_horizon() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let mut steps = steps_from(12, 3, SolarEstimate::new(0.0, 1.0, 2.0));
        steps.swap(0, 2);
        let err = Engine::new(SimConfig::new(100, 1), steps, &flat_profile(), battery(), now)
            .unwrap_err();
        assert_eq!(err, SimError::UnorderedForecast { index: 1 });
    }

    #[test]
    fn rejects_sample_count_below_two() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let steps = steps_from(12, 1, SolarEstimate::new(0.0, 1.0, 2.0));
        let err = Engine::new(SimConfig::new(1, 1), steps, &flat_profile(), battery(), now)
            .unwrap_err();
        assert_eq!(err, SimError::SampleCount { n_samples: 1 });
    }

    #[test]
    fn rejects_descending_percentiles() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let steps = steps_from(12, 1, SolarEstimate::new(0.0, 1.0, 2.0));
        let mut config = SimConfig::new(100, 1);
        config.percentiles = [97.5, 50.0, 2.5];
        let err = Engine::new(config, steps, &flat_profile(), battery(), now).unwrap_err();
        assert!(matches!(err, SimError::Percentiles { .. }));
    }

    #[test]
    fn rejects_charged_battery_with_zero_capacity() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let steps = steps_from(12, 1, SolarEstimate::new(0.0, 1.0, 2.0));
        let bad = BatteryParams {
            soc_kwh: 3.0,
            capacity_kwh: 0.0,
        };
        let err =
            Engine::new(SimConfig::new(100, 1), steps, &flat_profile(), bad, now).unwrap_err();
        assert!(matches!(err, SimError::InvalidBattery { .. }));
    }

    #[test]
    fn rejects_step_without_history_slot() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let base = tz().with_ymd_and_hms(2026, 8, 28, 12, 17, 0).unwrap();
        let steps = vec![ForecastStep {
            start: base,
            solar: SolarEstimate::new(0.0, 1.0, 2.0),
        }];
        let err = Engine::new(SimConfig::new(100, 1), steps, &flat_profile(), battery(), now)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::MissingProfile {
                time_of_day: NaiveTime::from_hms_opt(12, 17, 0).unwrap()
            }
        );
    }

    #[test]
    fn past_steps_hold_observed_charge() {
        // Horizon entirely before "now": battery bands stay pinned at the
        // observed 5.0 kWh no matter what the samples do.
        let now = tz().with_ymd_and_hms(2026, 8, 28, 23, 0, 0).unwrap();
        let steps = steps_from(8, 4, SolarEstimate::new(1.0, 3.0, 6.0));
        let mut engine =
            Engine::new(SimConfig::new(500, 9), steps, &flat_profile(), battery(), now)
                .expect("engine builds");
        let run = engine.run();
        for record in &run.records {
            assert_eq!(record.bat_low, 5.0);
            assert_eq!(record.bat_med, 5.0);
            assert_eq!(record.bat_high, 5.0);
        }
    }

    #[test]
    fn observed_charge_is_capacity_bounded_on_broadcast() {
        let now = tz().with_ymd_and_hms(2026, 8, 28, 23, 0, 0).unwrap();
        let steps = steps_from(8, 1, SolarEstimate::new(0.0, 0.0, 0.0));
        let over = BatteryParams {
            soc_kwh: 12.0,
            capacity_kwh: 10.0,
        };
        let mut engine = Engine::new(SimConfig::new(100, 9), steps, &flat_profile(), over, now)
            .expect("engine builds");
        let run = engine.run();
        assert_eq!(run.records[0].bat_med, 10.0);
    }

    #[test]
    fn soc_chain_carries_across_steps() {
        // Constant 0.4 consumption, zero solar, no noise: SoC must fall by
        // exactly 0.4 per forward step.
        let now = tz().with_ymd_and_hms(2026, 8, 28, 8, 0, 0).unwrap();
        let steps = steps_from(8, 3, SolarEstimate::new(0.0, 0.0, 0.0));
        let mut engine =
            Engine::new(SimConfig::new(100, 9), steps, &flat_profile(), battery(), now)
                .expect("engine builds");
        let run = engine.run();
        let med: Vec<f64> = run.records.iter().map(|r| r.bat_med).collect();
        assert_eq!(med, vec![4.6, 4.2, 3.8]);
    }

    #[test]
    fn later_days_do_not_touch_daily_totals() {
        // Horizon three days out: neither accumulator sees any flow.
        let now = tz().with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let steps = steps_from(12, 2, SolarEstimate::new(1.0, 2.0, 3.0));
        let mut engine =
            Engine::new(SimConfig::new(200, 4), steps, &flat_profile(), battery(), now)
                .expect("engine builds");
        let run = engine.run();
        assert_eq!(run.daily.today_charge, 0.0);
        assert_eq!(run.daily.tomorrow_charge, 0.0);
        assert_eq!(run.daily.tomorrow_import, 0.0);
    }
}

//! Forecast input data: JSON loading and the built-in synthetic demo.
//!
//! The ingestion layer (Home Assistant history API, Solcast attributes) is
//! out of scope; this module only defines the data shapes the core consumes
//! and a seeded synthetic stand-in so the binary runs without a live export.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::config::ForecastConfig;
use crate::history::MeterReading;
use crate::models::SolarEstimate;
use crate::sim::types::ForecastStep;

/// One tiered solar forecast period (Solcast-style attribute row).
///
/// Estimates are average power (kW) over the period; they are scaled to
/// per-step energy when the forecast horizon is built.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SolarPeriod {
    /// Period start timestamp.
    pub period_start: DateTime<Utc>,
    /// 10th percentile generation estimate (kW).
    pub pv_estimate10: f64,
    /// Median generation estimate (kW).
    pub pv_estimate: f64,
    /// 90th percentile generation estimate (kW).
    pub pv_estimate90: f64,
}

/// Complete forecast input: meter history, tiered solar forecast, and
/// observed battery scalars.
#[derive(Debug, Clone, Deserialize)]
pub struct InputData {
    /// Raw cumulative-meter readings over the trailing window.
    pub meter_history: Vec<MeterReading>,
    /// Tiered solar forecast periods, today through day 4.
    pub solar_forecast: Vec<SolarPeriod>,
    /// Current battery state of charge (kWh).
    pub battery_soc_kwh: f64,
    /// Battery capacity (kWh).
    pub battery_capacity_kwh: f64,
}

impl InputData {
    /// Loads input data from a JSON file.
    pub fn from_json_path(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|err| format!("failed to read input `{}`: {err}", path.display()))?;
        serde_json::from_str(&raw)
            .map_err(|err| format!("invalid JSON in input `{}`: {err}", path.display()))
    }

    /// Builds the forecast horizon, converting average-kW estimates into
    /// per-step energy (kWh) for the configured grid step.
    pub fn forecast_steps(&self, tz: Tz, step_minutes: u32) -> Vec<ForecastStep> {
        let energy_scale = f64::from(step_minutes) / 60.0;
        self.solar_forecast
            .iter()
            .map(|p| ForecastStep {
                start: p.period_start.with_timezone(&tz),
                solar: SolarEstimate::new(
                    p.pv_estimate10 * energy_scale,
                    p.pv_estimate * energy_scale,
                    p.pv_estimate90 * energy_scale,
                ),
            })
            .collect()
    }
}

/// Local midnight `day_offset` days away from `now`.
pub fn local_midnight(now: DateTime<Tz>, day_offset: i64) -> DateTime<Tz> {
    let date = (now + Duration::days(day_offset)).date_naive();
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(now.timezone())
        .earliest()
        .unwrap_or(now + Duration::days(day_offset))
}

/// Generates a seeded synthetic input: an evening-peaked household meter
/// history and a four-day daylight-arc solar forecast.
pub fn demo_input(config: &ForecastConfig, now: DateTime<Tz>) -> InputData {
    let mut rng = StdRng::seed_from_u64(config.simulation.seed);
    let step_minutes = config.history.step_minutes;
    let step_hours = f64::from(step_minutes) / 60.0;

    // Meter history: cumulative kWh over the trailing window, evening-peaked
    // base load with uniform jitter per step.
    let mut meter_history = Vec::new();
    let mut t = local_midnight(now, -i64::from(config.history.window_days));
    let mut cumulative = 0.0;
    while t <= now {
        meter_history.push(MeterReading {
            at: t.with_timezone(&Utc),
            state_kwh: cumulative,
        });
        let jitter = 0.85 + 0.3 * rng.random::<f64>();
        cumulative += demand_kw(t.time()) * step_hours * jitter;
        t += Duration::minutes(i64::from(step_minutes));
    }

    // Solar forecast: local midnight today through the end of day 4.
    let mut solar_forecast = Vec::new();
    let mut t = local_midnight(now, 0);
    let horizon_end = local_midnight(now, 4);
    while t < horizon_end {
        let med = 3.5 * daylight_frac(t.time());
        solar_forecast.push(SolarPeriod {
            period_start: t.with_timezone(&Utc),
            pv_estimate10: 0.45 * med,
            pv_estimate: med,
            pv_estimate90: 1.5 * med,
        });
        t += Duration::minutes(i64::from(step_minutes));
    }

    InputData {
        meter_history,
        solar_forecast,
        battery_soc_kwh: config.battery.soc_kwh,
        battery_capacity_kwh: config.battery.capacity_kwh,
    }
}

/// Household demand in kW at a local time of day, peaking in the evening.
fn demand_kw(time: NaiveTime) -> f64 {
    let hour = f64::from(time.hour()) + f64::from(time.minute()) / 60.0;
    let phase = PI / 2.0 - 2.0 * PI * 19.0 / 24.0;
    (0.4 + 0.25 * (2.0 * PI * hour / 24.0 + phase).sin()).max(0.05)
}

/// Bell-shaped daylight fraction between 07:00 and 19:00 local.
fn daylight_frac(time: NaiveTime) -> f64 {
    let hour = f64::from(time.hour()) + f64::from(time.minute()) / 60.0;
    if !(7.0..19.0).contains(&hour) {
        return 0.0;
    }
    (PI * (hour - 7.0) / 12.0).sin().powi(2)
}

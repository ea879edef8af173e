//! Shared test fixtures for integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use homecast::history::MeterReading;
use homecast::models::SolarEstimate;
use homecast::sim::battery::BatteryParams;
use homecast::sim::types::{ForecastStep, SimConfig};

/// Default local timezone for fixtures (UTC+2 in August).
pub fn tz() -> Tz {
    "Europe/Amsterdam".parse().expect("valid timezone")
}

/// Noon local on 2026-08-28, the reference "now" for fixtures.
pub fn noon() -> DateTime<Tz> {
    tz().with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap()
}

/// Default simulation configuration (20 000 samples, seed 42).
pub fn default_config() -> SimConfig {
    SimConfig::new(20_000, 42)
}

/// Default battery (5 kWh charged of 10 kWh capacity).
pub fn default_battery() -> BatteryParams {
    BatteryParams {
        soc_kwh: 5.0,
        capacity_kwh: 10.0,
    }
}

/// Cumulative meter history on a clean half-hour grid.
///
/// Covers one full day per entry of `day_increments`, ending at local
/// midnight today; every slot of day `d` increments by `day_increments[d]`
/// kWh, so each time-of-day slot observes exactly that set of values.
/// All timestamps are UTC.
pub fn meter_history(day_increments: &[f64]) -> Vec<MeterReading> {
    let days = day_increments.len();
    let start = tz().with_ymd_and_hms(2026, 8, 28, 0, 0, 0).unwrap()
        - Duration::days(days as i64);
    let slots = days * 48;
    let mut readings = Vec::with_capacity(slots + 1);
    let mut cumulative = 100.0;
    for i in 0..=slots {
        readings.push(MeterReading {
            at: (start + Duration::minutes(30 * i as i64)).with_timezone(&Utc),
            state_kwh: cumulative,
        });
        cumulative += day_increments[(i / 48).min(days - 1)];
    }
    readings
}

/// Half-hour forecast steps from a local start time, all carrying the same
/// tiered solar estimate.
pub fn steps_at(start: DateTime<Tz>, count: usize, solar: SolarEstimate) -> Vec<ForecastStep> {
    (0..count)
        .map(|i| ForecastStep {
            start: start + Duration::minutes(30 * i as i64),
            solar,
        })
        .collect()
}

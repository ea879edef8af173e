//! Core simulation types: configuration, forecast steps, records, and errors.

use std::fmt;

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::SolarEstimate;
use crate::sim::percentile::Band;

/// Default Monte Carlo population size.
pub const DEFAULT_SAMPLES: usize = 20_000;

/// Default percentile triple: a 95% likelihood band around the median.
pub const DEFAULT_PERCENTILES: [f64; 3] = [2.5, 50.0, 97.5];

/// Centralized simulation configuration.
///
/// # Examples
///
/// ```
/// use homecast::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(20_000, 42);
/// assert_eq!(cfg.percentiles, [2.5, 50.0, 97.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Monte Carlo population size (trades simulation noise for latency).
    pub n_samples: usize,
    /// Ascending percentile triple used for every band reduction.
    pub percentiles: [f64; 3],
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a configuration with the default percentile triple.
    pub fn new(n_samples: usize, seed: u64) -> Self {
        Self {
            n_samples,
            percentiles: DEFAULT_PERCENTILES,
            seed,
        }
    }
}

/// One point of the forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    /// Step start, timezone-aware.
    pub start: DateTime<Tz>,
    /// Tiered generation estimate for the step (kWh).
    pub solar: SolarEstimate,
}

impl ForecastStep {
    /// Local time of day keying the consumption profile.
    pub fn time_of_day(&self) -> NaiveTime {
        self.start.time()
    }
}

/// Percentile bands for one forecast step, with the flat field names the
/// published payload uses. Values are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    /// Step start as an RFC 3339 timestamp in the local timezone.
    pub index: String,
    pub net_low: f64,
    pub net_med: f64,
    pub net_high: f64,
    pub sol_low: f64,
    pub sol_med: f64,
    pub sol_high: f64,
    pub ene_low: f64,
    pub ene_med: f64,
    pub ene_high: f64,
    pub bat_low: f64,
    pub bat_med: f64,
    pub bat_high: f64,
    pub cene_low: f64,
    pub cene_med: f64,
    pub cene_high: f64,
    pub csol_low: f64,
    pub csol_med: f64,
    pub csol_high: f64,
}

impl ForecastRecord {
    /// Builds a record from the six reduced bands of one step.
    pub fn from_bands(
        start: DateTime<Tz>,
        net: Band,
        solar: Band,
        consumption: Band,
        battery: Band,
        cum_consumption: Band,
        cum_solar: Band,
    ) -> Self {
        Self {
            index: start.to_rfc3339(),
            net_low: round2(net.low),
            net_med: round2(net.med),
            net_high: round2(net.high),
            sol_low: round2(solar.low),
            sol_med: round2(solar.med),
            sol_high: round2(solar.high),
            ene_low: round2(consumption.low),
            ene_med: round2(consumption.med),
            ene_high: round2(consumption.high),
            bat_low: round2(battery.low),
            bat_med: round2(battery.med),
            bat_high: round2(battery.high),
            cene_low: round2(cum_consumption.low),
            cene_med: round2(cum_consumption.med),
            cene_high: round2(cum_consumption.high),
            csol_low: round2(cum_solar.low),
            csol_med: round2(cum_solar.med),
            csol_high: round2(cum_solar.high),
        }
    }
}

impl fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | net=[{:>6.2} {:>6.2} {:>6.2}] sol=[{:>5.2} {:>5.2} {:>5.2}] \
             ene=[{:>5.2} {:>5.2} {:>5.2}] bat=[{:>5.2} {:>5.2} {:>5.2}] kWh",
            self.index,
            self.net_low,
            self.net_med,
            self.net_high,
            self.sol_low,
            self.sol_med,
            self.sol_high,
            self.ene_low,
            self.ene_med,
            self.ene_high,
            self.bat_low,
            self.bat_med,
            self.bat_high,
        )
    }
}

/// Median daily totals for today and tomorrow (kWh, rounded to 2 decimals),
/// with the flat field names the published payload uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregates {
    pub today_charge: f64,
    pub today_export: f64,
    pub today_consumed: f64,
    pub today_discharge: f64,
    pub today_import: f64,
    pub tomorrow_charge: f64,
    pub tomorrow_export: f64,
    pub tomorrow_consumed: f64,
    pub tomorrow_discharge: f64,
    pub tomorrow_import: f64,
}

impl fmt::Display for DailyAggregates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Daily Energy Totals (median) ---")?;
        writeln!(
            f,
            "today:    charge={:>6.2}  export={:>6.2}  self-consumed={:>6.2}  \
             discharge={:>6.2}  import={:>6.2} kWh",
            self.today_charge,
            self.today_export,
            self.today_consumed,
            self.today_discharge,
            self.today_import,
        )?;
        write!(
            f,
            "tomorrow: charge={:>6.2}  export={:>6.2}  self-consumed={:>6.2}  \
             discharge={:>6.2}  import={:>6.2} kWh",
            self.tomorrow_charge,
            self.tomorrow_export,
            self.tomorrow_consumed,
            self.tomorrow_discharge,
            self.tomorrow_import,
        )
    }
}

/// Validation error detected before any simulation step runs.
///
/// The engine never emits partial output: every variant aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The forecast step sequence is empty.
    EmptyForecast,
    /// Step `index` does not start strictly after step `index - 1`.
    UnorderedForecast { index: usize },
    /// No historical consumption backs this time-of-day.
    MissingProfile { time_of_day: NaiveTime },
    /// The fitted consumption distribution for this time-of-day is not finite.
    DegenerateProfile { time_of_day: NaiveTime },
    /// Battery scalars describe an impossible state.
    InvalidBattery { soc_kwh: f64, capacity_kwh: f64 },
    /// Percentile estimation over fewer than two samples is meaningless.
    SampleCount { n_samples: usize },
    /// Percentile triple is not ascending within `[0, 100]`.
    Percentiles { requested: [f64; 3] },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyForecast => write!(f, "forecast error: empty step sequence"),
            Self::UnorderedForecast { index } => {
                write!(f, "forecast error: step {index} is not in chronological order")
            }
            Self::MissingProfile { time_of_day } => {
                write!(f, "forecast error: no consumption history for {time_of_day}")
            }
            Self::DegenerateProfile { time_of_day } => write!(
                f,
                "forecast error: degenerate consumption distribution for {time_of_day}"
            ),
            Self::InvalidBattery {
                soc_kwh,
                capacity_kwh,
            } => write!(
                f,
                "forecast error: invalid battery state ({soc_kwh} kWh of {capacity_kwh} kWh)"
            ),
            Self::SampleCount { n_samples } => {
                write!(f, "forecast error: sample count {n_samples} must be > 1")
            }
            Self::Percentiles { requested } => write!(
                f,
                "forecast error: percentiles {requested:?} must ascend within [0, 100]"
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Rounds to 2 decimals, the precision of the published payload.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! TOML-based forecast configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::sim::types::{DEFAULT_PERCENTILES, DEFAULT_SAMPLES};

/// Top-level forecast configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`ForecastConfig::from_toml_file`] or use
/// [`ForecastConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Monte Carlo and timezone parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Historical consumption window parameters.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Battery scalars for the synthetic demo scenario.
    #[serde(default)]
    pub battery: BatteryConfig,
}

/// Monte Carlo and timezone parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Sample population size (must be > 1).
    pub samples: usize,
    /// Master random seed.
    pub seed: u64,
    /// IANA timezone identifier for today/tomorrow classification.
    pub timezone: String,
    /// Ascending percentile triple for every band reduction.
    pub percentiles: [f64; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            seed: 42,
            timezone: "Europe/Amsterdam".to_string(),
            percentiles: DEFAULT_PERCENTILES,
        }
    }
}

/// Historical consumption window parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Trailing window length in days (must be > 0).
    pub window_days: u32,
    /// Grid step in minutes (must divide a day).
    pub step_minutes: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            step_minutes: 30,
        }
    }
}

/// Battery scalars for the synthetic demo scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Current state of charge (kWh).
    pub soc_kwh: f64,
    /// Usable capacity (kWh).
    pub capacity_kwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            soc_kwh: 6.0,
            capacity_kwh: 10.0,
        }
    }
}

/// Configuration loading or validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.samples"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ForecastConfig {
    /// Returns the baseline configuration (full 20000-sample population).
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            history: HistoryConfig::default(),
            battery: BatteryConfig::default(),
        }
    }

    /// Returns the quick preset: a small population for fast iteration at
    /// the cost of noisier bands.
    pub fn quick() -> Self {
        Self {
            simulation: SimulationConfig {
                samples: 2000,
                ..SimulationConfig::default()
            },
            history: HistoryConfig::default(),
            battery: BatteryConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "quick"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "quick" => Ok(Self::quick()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parses the configured timezone identifier.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the identifier is not a known IANA zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.simulation
            .timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError {
                field: "simulation.timezone".into(),
                message: e.to_string(),
            })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.samples <= 1 {
            errors.push(ConfigError {
                field: "simulation.samples".into(),
                message: "must be > 1".into(),
            });
        }
        let pct = s.percentiles;
        if !(pct[0] < pct[1] && pct[1] < pct[2]) || pct[0] < 0.0 || pct[2] > 100.0 {
            errors.push(ConfigError {
                field: "simulation.percentiles".into(),
                message: "must ascend within [0, 100]".into(),
            });
        }
        if s.timezone.parse::<Tz>().is_err() {
            errors.push(ConfigError {
                field: "simulation.timezone".into(),
                message: format!("unknown timezone \"{}\"", s.timezone),
            });
        }

        let h = &self.history;
        if h.window_days == 0 {
            errors.push(ConfigError {
                field: "history.window_days".into(),
                message: "must be > 0".into(),
            });
        }
        if h.step_minutes == 0 || 1440 % h.step_minutes != 0 {
            errors.push(ConfigError {
                field: "history.step_minutes".into(),
                message: "must divide a day".into(),
            });
        }

        let b = &self.battery;
        if b.capacity_kwh < 0.0 || (b.capacity_kwh == 0.0 && b.soc_kwh > 0.0) {
            errors.push(ConfigError {
                field: "battery.capacity_kwh".into(),
                message: "must be > 0 when the battery holds charge".into(),
            });
        }
        if b.soc_kwh < 0.0 {
            errors.push(ConfigError {
                field: "battery.soc_kwh".into(),
                message: "must be >= 0".into(),
            });
        }

        errors
    }
}

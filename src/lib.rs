//! Household net-energy and battery state-of-charge Monte Carlo forecaster.

pub mod config;
/// Cumulative-meter alignment and incremental consumption history.
pub mod history;
pub mod io;
/// Consumption and solar sampling models.
pub mod models;
pub mod scenario;
/// Monte Carlo driver, battery simulation, and percentile reduction.
pub mod sim;

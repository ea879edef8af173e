/// Battery state advance and derived flow populations.
pub mod battery;
pub mod engine;
/// Percentile reduction of sample populations.
pub mod percentile;
pub mod types;

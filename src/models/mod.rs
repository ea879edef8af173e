//! Sampling models for the Monte Carlo forecast.

/// Per-time-of-day empirical consumption model.
pub mod consumption;
/// Tiered solar generation sampler.
pub mod solar;

// Re-export the main types for convenience
pub use consumption::ConsumptionProfile;
pub use consumption::SlotStats;
pub use solar::SolarEstimate;

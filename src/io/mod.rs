//! Output writers for forecast results.

pub mod export;

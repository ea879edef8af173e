//! CSV and JSON export for forecast results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::sim::engine::ForecastRun;
use crate::sim::types::{DailyAggregates, ForecastRecord};

/// Column header for CSV forecast export, matching the record field order.
const HEADER: &str = "index,net_low,net_med,net_high,sol_low,sol_med,sol_high,\
                      ene_low,ene_med,ene_high,bat_low,bat_med,bat_high,\
                      cene_low,cene_med,cene_high,csol_low,csol_med,csol_high";

/// Published payload: the per-step forecast plus the flattened daily totals.
///
/// This is the attribute shape the home-automation sensor carries, so
/// downstream dashboards read `today_import` and friends at the top level.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    energy_forecast: &'a [ForecastRecord],
    #[serde(flatten)]
    daily: &'a DailyAggregates,
}

/// Exports forecast records to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[ForecastRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes forecast records as CSV to any writer.
///
/// One header row followed by one data row per forecast step. Values are
/// already rounded to 2 decimals, so identical runs produce identical bytes.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[ForecastRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;
    for r in records {
        wtr.write_record(&[
            r.index.clone(),
            r.net_low.to_string(),
            r.net_med.to_string(),
            r.net_high.to_string(),
            r.sol_low.to_string(),
            r.sol_med.to_string(),
            r.sol_high.to_string(),
            r.ene_low.to_string(),
            r.ene_med.to_string(),
            r.ene_high.to_string(),
            r.bat_low.to_string(),
            r.bat_med.to_string(),
            r.bat_high.to_string(),
            r.cene_low.to_string(),
            r.cene_med.to_string(),
            r.cene_high.to_string(),
            r.csol_low.to_string(),
            r.csol_med.to_string(),
            r.csol_high.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the full run as a JSON payload at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_json(run: &ForecastRun, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_json(run, buf)
}

/// Writes the full run as a pretty-printed JSON payload to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(run: &ForecastRun, mut writer: impl Write) -> io::Result<()> {
    let payload = Payload {
        energy_forecast: &run.records,
        daily: &run.daily,
    };
    serde_json::to_writer_pretty(&mut writer, &payload)?;
    writeln!(writer)?;
    Ok(())
}

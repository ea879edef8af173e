//! Alignment of raw cumulative-meter readings into an incremental
//! consumption table keyed by (time-of-day, day).
//!
//! The transform is deterministic: align readings to a fixed-interval grid by
//! linear interpolation in time, subtract each day's first reading, take the
//! first difference along time-of-day within each day, clamp negative
//! increments (meter resets, noise) to zero, and fill remaining gaps so that
//! every kept (time-of-day, day) cell holds exactly one non-negative value.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// One raw cumulative-meter reading.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MeterReading {
    /// Reading timestamp.
    pub at: DateTime<Utc>,
    /// Cumulative consumed energy at that instant (kWh).
    pub state_kwh: f64,
}

/// Error building the consumption history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// No finite meter readings were supplied.
    NoReadings,
    /// The grid step does not divide a day.
    InvalidStep { minutes: u32 },
    /// The requested range is empty.
    EmptyRange,
    /// No day in the range had complete grid coverage.
    NoCompleteDays,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReadings => write!(f, "history error: no finite meter readings"),
            Self::InvalidStep { minutes } => write!(
                f,
                "history error: step of {minutes} minutes does not divide a day"
            ),
            Self::EmptyRange => write!(f, "history error: range end is not after start"),
            Self::NoCompleteDays => {
                write!(f, "history error: no day with complete grid coverage")
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Incremental consumption table: one non-negative value per
/// (time-of-day, historical day) cell.
#[derive(Debug, Clone)]
pub struct ConsumptionHistory {
    slots: Vec<NaiveTime>,
    days: Vec<NaiveDate>,
    /// `values[slot][day]`, fully populated.
    values: Vec<Vec<f64>>,
}

impl ConsumptionHistory {
    /// Builds the table from raw cumulative readings over `[start, end]`.
    ///
    /// Readings are aligned to a `step_minutes` grid in the timezone of
    /// `start`/`end` by linear interpolation in time (nearest value beyond
    /// the observed range). Days without both their first and last grid slot
    /// are dropped — typically the partial current day.
    ///
    /// # Errors
    ///
    /// Returns a `HistoryError` if the step is invalid, the range is empty,
    /// no finite readings exist, or no complete day remains.
    pub fn build(
        readings: &[MeterReading],
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        step_minutes: u32,
    ) -> Result<Self, HistoryError> {
        if step_minutes == 0 || 1440 % step_minutes != 0 {
            return Err(HistoryError::InvalidStep {
                minutes: step_minutes,
            });
        }
        if end <= start {
            return Err(HistoryError::EmptyRange);
        }

        let mut sorted: Vec<MeterReading> = readings
            .iter()
            .copied()
            .filter(|r| r.state_kwh.is_finite())
            .collect();
        if sorted.is_empty() {
            return Err(HistoryError::NoReadings);
        }
        sorted.sort_by_key(|r| r.at);

        // Canonical time-of-day slots for the grid step.
        let slots: Vec<NaiveTime> = (0..1440 / step_minutes)
            .map(|i| {
                NaiveTime::from_num_seconds_from_midnight_opt(i * step_minutes * 60, 0)
                    .unwrap_or(NaiveTime::MIN)
            })
            .collect();
        let slot_index = |t: NaiveTime| slots.iter().position(|&s| s == t);

        // Align cumulative readings onto the grid, bucketed by local day.
        let mut days: Vec<NaiveDate> = Vec::new();
        let mut aligned: Vec<Vec<Option<f64>>> = Vec::new(); // [day][slot]
        let mut t = start;
        while t <= end {
            if let Some(si) = slot_index(t.time()) {
                let date = t.date_naive();
                let di = match days.iter().position(|&d| d == date) {
                    Some(i) => i,
                    None => {
                        days.push(date);
                        aligned.push(vec![None; slots.len()]);
                        days.len() - 1
                    }
                };
                aligned[di][si] = Some(interpolate_at(&sorted, t.with_timezone(&Utc)));
            }
            t += Duration::minutes(i64::from(step_minutes));
        }

        // Keep only days covering the full grid span.
        let last = slots.len() - 1;
        let kept: Vec<usize> = (0..days.len())
            .filter(|&di| aligned[di][0].is_some() && aligned[di][last].is_some())
            .collect();
        if kept.is_empty() {
            return Err(HistoryError::NoCompleteDays);
        }

        // Per day: daily baseline, first difference along time-of-day,
        // negative clamp, then gap fill.
        let mut values = vec![vec![0.0; kept.len()]; slots.len()];
        for (col, &di) in kept.iter().enumerate() {
            let day = &aligned[di];
            let baseline = day[0].unwrap_or(0.0);
            let within_day: Vec<Option<f64>> = day.iter().map(|v| v.map(|x| x - baseline)).collect();

            let mut increments: Vec<Option<f64>> = vec![None; slots.len()];
            for si in 1..slots.len() {
                if let (Some(prev), Some(cur)) = (within_day[si - 1], within_day[si]) {
                    increments[si] = Some((cur - prev).max(0.0));
                }
            }
            fill_gaps(&mut increments);

            for (si, inc) in increments.iter().enumerate() {
                values[si][col] = inc.unwrap_or(0.0);
            }
        }

        Ok(Self {
            slots,
            days: kept.into_iter().map(|di| days[di]).collect(),
            values,
        })
    }

    /// Historical incremental-consumption values for one time-of-day slot,
    /// one value per kept day.
    pub fn increments_at(&self, time_of_day: NaiveTime) -> Option<&[f64]> {
        self.slots
            .iter()
            .position(|&s| s == time_of_day)
            .map(|si| self.values[si].as_slice())
    }

    /// Time-of-day slots of the grid.
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    /// Kept historical days, oldest first.
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }
}

/// Linear interpolation of the cumulative series at instant `t`.
///
/// Beyond the observed range the nearest reading's value is used.
fn interpolate_at(sorted: &[MeterReading], t: DateTime<Utc>) -> f64 {
    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if t <= first.at {
        return first.state_kwh;
    }
    if t >= last.at {
        return last.state_kwh;
    }
    let idx = sorted.partition_point(|r| r.at <= t);
    let before = sorted[idx - 1];
    let after = sorted[idx];
    let span = (after.at - before.at).num_milliseconds();
    if span <= 0 {
        return after.state_kwh;
    }
    let frac = (t - before.at).num_milliseconds() as f64 / span as f64;
    before.state_kwh + (after.state_kwh - before.state_kwh) * frac
}

/// Fills `None` gaps: linear interpolation in the interior, nearest valid
/// value at both edges. Leaves the vector untouched if no value is present.
fn fill_gaps(values: &mut [Option<f64>]) {
    let valid: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return;
    };
    for i in 0..values.len() {
        if values[i].is_some() {
            continue;
        }
        if i < first {
            values[i] = values[first];
        } else if i > last {
            values[i] = values[last];
        } else {
            let prev = *valid.iter().rfind(|&&v| v < i).unwrap_or(&first);
            let next = *valid.iter().find(|&&v| v > i).unwrap_or(&last);
            let (Some(a), Some(b)) = (values[prev], values[next]) else {
                continue;
            };
            let frac = (i - prev) as f64 / (next - prev) as f64;
            values[i] = Some(a + (b - a) * frac);
        }
    }
}

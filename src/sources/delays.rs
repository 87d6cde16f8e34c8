//! Delay log loading.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{DelayRecord, normalize_trip_id};
use crate::sources::table::{Table, cell};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Column names of the delay log export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayColumns {
    pub date: String,
    pub trip_id: String,
    pub cause: String,
    pub duration: String,
}

impl Default for DelayColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            trip_id: "TRAINID".to_string(),
            cause: "DELAYCAUSE".to_string(),
            duration: "Delay (Minutes)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DelayLog {
    pub records: Vec<DelayRecord>,
    pub skipped_rows: usize,
}

/// Parses a delay-log date, accepting plain dates and the timestamp forms
/// spreadsheet exports produce.
pub fn parse_delay_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Blank is a valid, unknown duration (`Some(None)`); text and negative
/// numbers are unreadable (`None`).
fn parse_duration(raw: &str) -> Option<Option<f64>> {
    if raw.is_empty() {
        return Some(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(Some)
}

/// Loads every row of the delay log.
///
/// Rows without a readable date, without a trip id, or with a non-numeric
/// or negative duration are skipped and counted. A blank duration is kept
/// as unknown.
///
/// # Errors
///
/// Fails when a configured column is absent.
#[tracing::instrument(skip_all, fields(table = table.name(), rows = table.rows().len()))]
pub fn load_delay_log(table: &Table, columns: &DelayColumns) -> Result<DelayLog> {
    let date_col = table.column(&columns.date)?;
    let trip_col = table.column(&columns.trip_id)?;
    let cause_col = table.column(&columns.cause)?;
    let duration_col = table.column(&columns.duration)?;

    let mut log = DelayLog::default();

    for (line, record) in table.rows().iter().enumerate() {
        let date = parse_delay_date(cell(record, date_col));
        let trip = cell(record, trip_col);
        let duration = parse_duration(cell(record, duration_col));

        let (Some(date), Some(duration_minutes)) = (date, duration) else {
            debug!(line, "Skipping delay row with unreadable date or duration");
            log.skipped_rows += 1;
            continue;
        };
        if trip.is_empty() {
            debug!(line, "Skipping delay row without trip id");
            log.skipped_rows += 1;
            continue;
        }

        log.records.push(DelayRecord {
            date,
            trip_id: normalize_trip_id(trip),
            cause: cell(record, cause_col).to_string(),
            duration_minutes,
        });
    }

    info!(
        records = log.records.len(),
        skipped_rows = log.skipped_rows,
        "Delay log loaded"
    );
    if log.skipped_rows > 0 {
        warn!(skipped_rows = log.skipped_rows, "Some delay rows could not be read");
    }

    Ok(log)
}

//! Data types produced by the aggregation step.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::model::{EquipmentId, Vendor};

/// Inclusive date range the vendor statistics are restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The whole calendar year `year`.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole_year = self.start.year() == self.end.year()
            && self.start.ordinal() == 1
            && self.end.succ_opt().is_none_or(|next| next.year() != self.end.year());
        if whole_year {
            write!(f, "{}", self.start.year())
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

/// Which fleet size the per-unit rates are headlined against.
///
/// `Observed` counts distinct lead units seen in the windowed delays;
/// `Roster` counts every unit the roster assigns to the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FleetBasis {
    Observed,
    Roster,
}

impl FromStr for FleetBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(FleetBasis::Observed),
            "roster" => Ok(FleetBasis::Roster),
            other => Err(format!("unknown fleet basis '{other}', expected observed or roster")),
        }
    }
}

impl fmt::Display for FleetBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetBasis::Observed => f.write_str("observed"),
            FleetBasis::Roster => f.write_str("roster"),
        }
    }
}

/// Both notions of fleet size, side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetSize {
    pub observed: usize,
    pub roster: usize,
}

impl FleetSize {
    pub fn get(&self, basis: FleetBasis) -> usize {
        match basis {
            FleetBasis::Observed => self.observed,
            FleetBasis::Roster => self.roster,
        }
    }
}

/// Windowed delay statistics for one vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VendorStats {
    pub delays: usize,
    /// Delays whose duration was blank in the log.
    pub unmeasured_delays: usize,
    pub total_minutes: f64,
    pub mean_minutes: Option<f64>,
    pub fleet: FleetSize,
    pub observed_units: Vec<EquipmentId>,
    pub delays_per_observed_unit: Option<f64>,
    pub delays_per_roster_unit: Option<f64>,
    pub share_of_delays_pct: f64,
    pub share_of_roster_pct: f64,
}

impl VendorStats {
    pub fn delays_per_unit(&self, basis: FleetBasis) -> Option<f64> {
        match basis {
            FleetBasis::Observed => self.delays_per_observed_unit,
            FleetBasis::Roster => self.delays_per_roster_unit,
        }
    }
}

/// Estimate of the delay minutes avoided had every unit of `replaced`
/// carried `replacement`'s system.
///
/// Assumes the replacement's mean delay per event would apply to the
/// replaced vendor's event count. It is a substitution estimate, not a
/// measured effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counterfactual {
    pub replaced: Vendor,
    pub replacement: Vendor,
    pub replaced_delays: usize,
    pub replaced_total_minutes: f64,
    pub replaced_mean_minutes: f64,
    pub replacement_mean_minutes: f64,
    pub reduction_minutes: f64,
    pub mean_difference_minutes: f64,
    pub mean_difference_pct: f64,
}

/// How many retained delays (all dates) reached a vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coverage {
    pub total: usize,
    pub with_vendor: usize,
    pub without_vendor: usize,
    pub with_vendor_pct: f64,
}

/// Complete aggregation result, rendered as text or JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PtcReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub window: ReportWindow,
    pub coverage: Coverage,
    /// Retained delays per cause code, all dates.
    pub causes: BTreeMap<String, usize>,
    pub vendors: BTreeMap<Vendor, VendorStats>,
    pub counterfactual: Option<Counterfactual>,
    /// Windowed delay counts per `YYYY-MM` month and vendor.
    pub monthly: BTreeMap<String, BTreeMap<Vendor, usize>>,
}

impl PtcReport {
    pub fn vendor(&self, vendor: Vendor) -> Option<&VendorStats> {
        self.vendors.get(&vendor)
    }
}

//! Record types shared by the loaders, the matcher and the aggregator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a powered unit (locomotive or self-propelled car).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(pub i64);

impl EquipmentId {
    /// Converts a raw cell into an id by numeric truncation, so `"5001"`,
    /// `"5001.0"` and `" 5001.9 "` all yield `5001`.
    ///
    /// Blank and non-numeric cells yield `None`.
    pub fn from_cell(cell: &str) -> Option<Self> {
        parse_truncated(cell).map(Self)
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn parse_truncated(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let value = trimmed.parse::<f64>().ok()?.trunc();
    // i64 covers [-2^63, 2^63).
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !value.is_finite() || value >= LIMIT || value < -LIMIT {
        return None;
    }
    Some(value as i64)
}

/// Canonical form of a numeric trip id: the integer value without decimals
/// or grouping, e.g. `"101.0"` becomes `"101"`.
pub fn canonical_trip_id(raw: &str) -> Option<String> {
    parse_truncated(raw).map(|n| n.to_string())
}

/// Normalizes a trip id from any source: numeric ids take their canonical
/// form, anything else is only trimmed.
pub fn normalize_trip_id(raw: &str) -> String {
    canonical_trip_id(raw).unwrap_or_else(|| raw.trim().to_string())
}

/// PTC vendor system installed on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Vendor {
    Alstom,
    Siemens,
}

impl Vendor {
    pub const ALL: [Vendor; 2] = [Vendor::Alstom, Vendor::Siemens];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Alstom => "Alstom",
            Vendor::Siemens => "Siemens",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alstom" => Ok(Vendor::Alstom),
            "siemens" => Ok(Vendor::Siemens),
            other => Err(format!("unknown PTC vendor '{other}'")),
        }
    }
}

/// Service-calendar classification that decides which schedule runs.
///
/// Serialized with the schedule's own day codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "MF")]
    Weekday,
    #[serde(rename = "SA")]
    Saturday,
    #[serde(rename = "SS")]
    SundayOrHoliday,
}

impl DayType {
    pub fn code(&self) -> &'static str {
        match self {
            DayType::Weekday => "MF",
            DayType::Saturday => "SA",
            DayType::SundayOrHoliday => "SS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "MF" => Some(DayType::Weekday),
            "SA" => Some(DayType::Saturday),
            "SS" => Some(DayType::SundayOrHoliday),
            _ => None,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the delay log.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayRecord {
    pub date: NaiveDate,
    pub trip_id: String,
    pub cause: String,
    /// `None` when the log leaves the duration blank; the row still counts
    /// as a delay event.
    pub duration_minutes: Option<f64>,
}

/// A retained delay with whatever equipment and vendor could be resolved.
///
/// Field names double as the column names of the results CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDelayRecord {
    pub date: NaiveDate,
    pub train_id: String,
    pub delay_cause: String,
    pub delay_minutes: Option<f64>,
    pub lead_equipment: Option<EquipmentId>,
    pub ptc_system: Option<Vendor>,
    pub engine_type: Option<String>,
    pub day_of_week: DayType,
}

/// Outcome of one keyed lookup against a reference map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    /// The source listed the key more than once with different values.
    /// Carries the value that was kept.
    Ambiguous(T),
    Unresolved,
}

impl<T> Resolution<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) | Resolution::Ambiguous(v) => Some(v),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(v) => Resolution::Resolved(f(v)),
            Resolution::Ambiguous(v) => Resolution::Ambiguous(f(v)),
            Resolution::Unresolved => Resolution::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_id_truncates_numeric_forms() {
        assert_eq!(EquipmentId::from_cell("5001"), Some(EquipmentId(5001)));
        assert_eq!(EquipmentId::from_cell("5001.0"), Some(EquipmentId(5001)));
        assert_eq!(EquipmentId::from_cell(" 5001.9 "), Some(EquipmentId(5001)));
    }

    #[test]
    fn test_equipment_id_rejects_blank_and_text() {
        assert_eq!(EquipmentId::from_cell(""), None);
        assert_eq!(EquipmentId::from_cell("   "), None);
        assert_eq!(EquipmentId::from_cell("TBD"), None);
        assert_eq!(EquipmentId::from_cell("nan"), None);
        assert_eq!(EquipmentId::from_cell("inf"), None);
    }

    #[test]
    fn test_equipment_id_outside_i64_is_rejected() {
        assert_eq!(EquipmentId::from_cell("1e19"), None);
        assert_eq!(EquipmentId::from_cell("2e19"), None);
        assert_eq!(EquipmentId::from_cell("-1e19"), None);
        assert_eq!(EquipmentId::from_cell("9223372036854775808"), None);
        assert_eq!(
            EquipmentId::from_cell("9223372036854775807"),
            Some(EquipmentId(i64::MAX))
        );
        assert_eq!(EquipmentId::from_cell("1e18"), Some(EquipmentId(1_000_000_000_000_000_000)));
    }

    #[test]
    fn test_trip_id_normalization() {
        assert_eq!(canonical_trip_id("101.0"), Some("101".to_string()));
        assert_eq!(canonical_trip_id("A101"), None);
        assert_eq!(normalize_trip_id(" 3857 "), "3857");
        assert_eq!(normalize_trip_id(" A101 "), "A101");
    }

    #[test]
    fn test_vendor_from_str_is_case_insensitive() {
        assert_eq!("alstom".parse::<Vendor>(), Ok(Vendor::Alstom));
        assert_eq!(" SIEMENS ".parse::<Vendor>(), Ok(Vendor::Siemens));
        assert!("Wabtec".parse::<Vendor>().is_err());
    }

    #[test]
    fn test_day_type_codes() {
        for day in [DayType::Weekday, DayType::Saturday, DayType::SundayOrHoliday] {
            assert_eq!(DayType::from_code(day.code()), Some(day));
        }
        assert_eq!(DayType::from_code("sa"), Some(DayType::Saturday));
        assert_eq!(DayType::from_code("XX"), None);
    }

    #[test]
    fn test_resolution_value() {
        assert_eq!(Resolution::Resolved(3).value(), Some(3));
        assert_eq!(Resolution::Ambiguous(4).value(), Some(4));
        assert!(Resolution::Ambiguous(4).is_ambiguous());
        assert!(!Resolution::<i64>::Unresolved.is_resolved());
        assert_eq!(Resolution::Resolved(3).map(|v| v * 2), Resolution::Resolved(6));
    }
}

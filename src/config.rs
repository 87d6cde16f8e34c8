//! Reference configuration: holidays, cause allow-lists and source layouts.
//!
//! Every field has a built-in default, so the JSON file only needs the parts
//! that differ:
//! ```json
//! {
//!   "holidays": ["2025-01-01", "2025-01-20"],
//!   "cause_lists": { "current": ["NJT PTC", "NJT PTC MECHANICAL"] },
//!   "roster": { "boundary_marker": "Total Alstom", "start_row": 4 }
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::calendar::{ServiceCalendar, default_holidays};
use crate::error::{Error, Result};
use crate::sources::{ConsistLayout, DelayColumns, RosterLayout, ScheduleColumns};

/// Name of the allow-list first used by the analysis. It spelled three of
/// the causes with the `NJ` prefix and undercounts PTC delays.
pub const LEGACY_CAUSE_LIST: &str = "legacy";
/// Name of the corrected allow-list.
pub const CURRENT_CAUSE_LIST: &str = "current";

const LEGACY_CAUSES: &[&str] = &[
    "NJ PTC",
    "NJ PTC HUMAN ERROR",
    "NJ PTC INFRASTRUCTURE",
    "NJT PTC MECHANICAL",
];

const CURRENT_CAUSES: &[&str] = &[
    "NJT PTC",
    "NJT PTC HUMAN ERROR",
    "NJT PTC INFRASTRUCTURE",
    "NJT PTC MECHANICAL",
];

/// A named, versioned set of delay causes treated as PTC related.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseAllowList {
    version: String,
    causes: BTreeSet<String>,
}

impl CauseAllowList {
    pub fn new<I, S>(version: impl Into<String>, causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            version: version.into(),
            causes: causes
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn causes(&self) -> impl Iterator<Item = &str> {
        self.causes.iter().map(String::as_str)
    }

    /// Exact match after trimming; case matters.
    pub fn contains(&self, cause: &str) -> bool {
        self.causes.contains(cause.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub holidays: Vec<NaiveDate>,
    /// Allow-lists by version name. Entries here replace or extend the
    /// shipped `legacy` and `current` lists.
    pub cause_lists: BTreeMap<String, Vec<String>>,
    pub roster: RosterLayout,
    pub consist: ConsistLayout,
    pub delay_columns: DelayColumns,
    pub schedule_columns: ScheduleColumns,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            holidays: default_holidays(),
            cause_lists: default_cause_lists(),
            roster: RosterLayout::default(),
            consist: ConsistLayout::default(),
            delay_columns: DelayColumns::default(),
            schedule_columns: ScheduleColumns::default(),
        }
    }
}

fn default_cause_lists() -> BTreeMap<String, Vec<String>> {
    let list = |causes: &[&str]| -> Vec<String> { causes.iter().map(|c| c.to_string()).collect() };
    BTreeMap::from([
        (LEGACY_CAUSE_LIST.to_string(), list(LEGACY_CAUSES)),
        (CURRENT_CAUSE_LIST.to_string(), list(CURRENT_CAUSES)),
    ])
}

impl ReferenceConfig {
    /// Loads a config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content).map_err(|e| Error::configuration(format!("{path}: {e}")))
    }

    /// Parses a JSON config. Cause lists given here are merged over the
    /// shipped ones.
    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse(content).map_err(|e| Error::configuration(e.to_string()))
    }

    fn parse(content: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(content)?;

        let mut lists = default_cause_lists();
        lists.append(&mut config.cause_lists);
        config.cause_lists = lists;

        debug!(
            holidays = config.holidays.len(),
            cause_lists = config.cause_lists.len(),
            "Reference config parsed"
        );
        Ok(config)
    }

    /// Returns the allow-list registered under `version`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] for an unknown version.
    pub fn allow_list(&self, version: &str) -> Result<CauseAllowList> {
        self.cause_lists
            .get(version)
            .map(|causes| CauseAllowList::new(version, causes))
            .ok_or_else(|| {
                let known: Vec<&str> = self.cause_lists.keys().map(String::as_str).collect();
                Error::configuration(format!(
                    "unknown cause list '{version}', expected one of: {}",
                    known.join(", ")
                ))
            })
    }

    pub fn calendar(&self) -> ServiceCalendar {
        ServiceCalendar::new(self.holidays.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayType;

    #[test]
    fn test_shipped_lists_differ_in_prefix() {
        let config = ReferenceConfig::default();
        let legacy = config.allow_list(LEGACY_CAUSE_LIST).unwrap();
        let current = config.allow_list(CURRENT_CAUSE_LIST).unwrap();

        assert!(legacy.contains("NJ PTC"));
        assert!(!legacy.contains("NJT PTC"));
        assert!(current.contains("NJT PTC"));
        assert!(current.contains(" NJT PTC HUMAN ERROR "));
        assert!(!current.contains("NJ PTC"));
        assert!(legacy.contains("NJT PTC MECHANICAL"));
        assert_eq!(current.version(), "current");
    }

    #[test]
    fn test_unknown_list_is_a_configuration_error() {
        let err = ReferenceConfig::default().allow_list("v9").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("current"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReferenceConfig::from_json(
            r#"{ "holidays": ["2025-01-01"], "roster": { "start_row": 2 } }"#,
        )
        .unwrap();

        assert_eq!(config.roster.start_row, 2);
        assert_eq!(config.roster.boundary_marker, "Total Alstom");
        assert_eq!(config.consist, ConsistLayout::default());
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(config.calendar().classify(new_year), DayType::SundayOrHoliday);
        assert!(config.allow_list(CURRENT_CAUSE_LIST).is_ok());
    }

    #[test]
    fn test_json_cause_lists_merge_over_shipped() {
        let config = ReferenceConfig::from_json(
            r#"{ "cause_lists": { "current": ["NJT PTC"], "wide": ["NJT PTC", "AMTK PTC"] } }"#,
        )
        .unwrap();

        let current = config.allow_list(CURRENT_CAUSE_LIST).unwrap();
        assert_eq!(current.causes().count(), 1);
        assert!(config.allow_list("wide").unwrap().contains("AMTK PTC"));
        assert!(config.allow_list(LEGACY_CAUSE_LIST).is_ok());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = ReferenceConfig::from_json("{ holidays: ").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}

//! Scheduled-service ("starts") fallback index.
//!
//! Used only for trips the consist summary does not cover. The equipment
//! field lists the planned units with the lead unit first.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{DayType, EquipmentId, Resolution, normalize_trip_id};
use crate::sources::table::{Table, cell};

/// Column names of the scheduled-service table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleColumns {
    pub trip_id: String,
    pub day_type: String,
    pub equipment: String,
}

impl Default for ScheduleColumns {
    fn default() -> Self {
        Self {
            trip_id: "move".to_string(),
            day_type: "day".to_string(),
            equipment: "equipment".to_string(),
        }
    }
}

type ServiceKey = (String, DayType);

/// (trip id, day type) to the planned equipment tokens.
///
/// The first row for a key is the one used.
#[derive(Debug, Clone, Default)]
pub struct ScheduledServiceIndex {
    services: HashMap<ServiceKey, Vec<String>>,
    conflicts: HashSet<ServiceKey>,
    skipped_rows: usize,
}

impl ScheduledServiceIndex {
    /// # Errors
    ///
    /// Fails when the table lacks one of the configured columns.
    #[tracing::instrument(skip_all, fields(table = table.name(), rows = table.rows().len()))]
    pub fn from_table(table: &Table, columns: &ScheduleColumns) -> Result<Self> {
        let trip_col = table.column(&columns.trip_id)?;
        let day_col = table.column(&columns.day_type)?;
        let equipment_col = table.column(&columns.equipment)?;

        let mut index = Self::default();

        for record in table.rows() {
            let trip = cell(record, trip_col);
            let day = DayType::from_code(cell(record, day_col));

            let Some(day) = day.filter(|_| !trip.is_empty()) else {
                debug!(trip, day = cell(record, day_col), "Skipping schedule row");
                index.skipped_rows += 1;
                continue;
            };

            let tokens = cell(record, equipment_col)
                .split_whitespace()
                .map(str::to_string)
                .collect();
            index.insert(normalize_trip_id(trip), day, tokens);
        }

        info!(
            services = index.services.len(),
            skipped_rows = index.skipped_rows,
            conflicts = index.conflicts.len(),
            "Scheduled-service index built"
        );
        Ok(index)
    }

    pub fn insert(&mut self, trip_id: String, day: DayType, tokens: Vec<String>) {
        let key = (trip_id, day);
        match self.services.get(&key) {
            Some(existing) => {
                if existing.first() != tokens.first() {
                    self.conflicts.insert(key);
                }
            }
            None => {
                self.services.insert(key, tokens);
            }
        }
    }

    pub fn tokens(&self, trip_id: &str, day: DayType) -> Option<&[String]> {
        self.services
            .get(&(normalize_trip_id(trip_id), day))
            .map(Vec::as_slice)
    }

    /// Lead unit planned for `trip_id` on `day`.
    ///
    /// Only the first token is considered; trailing units do not carry the
    /// PTC system. A first token that is not numeric leaves the trip
    /// unresolved.
    pub fn lead(&self, trip_id: &str, day: DayType) -> Resolution<EquipmentId> {
        let key = (normalize_trip_id(trip_id), day);
        let Some(lead) = self
            .services
            .get(&key)
            .and_then(|tokens| tokens.first())
            .and_then(|token| EquipmentId::from_cell(token))
        else {
            return Resolution::Unresolved;
        };

        if self.conflicts.contains(&key) {
            Resolution::Ambiguous(lead)
        } else {
            Resolution::Resolved(lead)
        }
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

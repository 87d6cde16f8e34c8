//! Trip-summary (consist) resolution: which unit led each trip.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::model::{EquipmentId, Resolution, canonical_trip_id, normalize_trip_id};

/// Positional layout of the headerless trip-summary grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistLayout {
    pub trip_column: usize,
    pub equipment_column: usize,
    pub engine_type_column: usize,
}

impl Default for ConsistLayout {
    fn default() -> Self {
        Self {
            trip_column: 2,
            equipment_column: 4,
            engine_type_column: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistEntry {
    pub equipment: EquipmentId,
    pub engine_type: Option<String>,
}

/// Canonical trip id to lead unit. Later summary rows replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TripEquipmentMap {
    entries: HashMap<String, ConsistEntry>,
    conflicts: HashSet<String>,
    skipped_rows: usize,
}

impl TripEquipmentMap {
    /// Builds the map from summary rows, skipping rows whose trip or
    /// equipment cell is missing or non-numeric.
    #[tracing::instrument(skip_all, fields(rows = grid.len()))]
    pub fn from_grid(grid: &[Vec<String>], layout: &ConsistLayout) -> Self {
        let mut map = Self::default();

        for row in grid {
            let trip = row.get(layout.trip_column).and_then(|c| canonical_trip_id(c));
            let equipment = row
                .get(layout.equipment_column)
                .and_then(|c| EquipmentId::from_cell(c));

            let (Some(trip), Some(equipment)) = (trip, equipment) else {
                map.skipped_rows += 1;
                continue;
            };

            let engine_type = row
                .get(layout.engine_type_column)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            map.insert(
                trip,
                ConsistEntry {
                    equipment,
                    engine_type,
                },
            );
        }

        info!(
            trips = map.entries.len(),
            skipped_rows = map.skipped_rows,
            conflicts = map.conflicts.len(),
            "Consist map built"
        );
        if !map.conflicts.is_empty() {
            warn!(
                conflicts = map.conflicts.len(),
                "Some trips appear with different lead units, keeping the last row"
            );
        }

        map
    }

    pub fn insert(&mut self, trip_id: String, entry: ConsistEntry) {
        if let Some(previous) = self.entries.get(&trip_id) {
            if previous.equipment != entry.equipment {
                self.conflicts.insert(trip_id.clone());
            }
        }
        self.entries.insert(trip_id, entry);
    }

    /// Looks up a trip by id; numeric ids in any textual form match.
    pub fn resolve(&self, trip_id: &str) -> Resolution<&ConsistEntry> {
        let key = normalize_trip_id(trip_id);
        match self.entries.get(&key) {
            Some(entry) if self.conflicts.contains(&key) => Resolution::Ambiguous(entry),
            Some(entry) => Resolution::Resolved(entry),
            None => Resolution::Unresolved,
        }
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trip: &str, equipment: &str, engine: Option<&str>) -> Vec<String> {
        let mut cells = vec![String::new(); 19];
        cells[0] = "2024-03-01".to_string();
        cells[2] = trip.to_string();
        cells[4] = equipment.to_string();
        if let Some(engine) = engine {
            cells[18] = engine.to_string();
        }
        cells
    }

    #[test]
    fn test_resolves_trip_with_engine_type() {
        let grid = vec![row("101", "5001", Some("ALP-46"))];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());

        match map.resolve("101") {
            Resolution::Resolved(entry) => {
                assert_eq!(entry.equipment, EquipmentId(5001));
                assert_eq!(entry.engine_type.as_deref(), Some("ALP-46"));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_float_forms_are_normalized() {
        let grid = vec![row("101.0", "5001.0", None)];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());

        let entry = map.resolve("101").value().unwrap();
        assert_eq!(entry.equipment, EquipmentId(5001));
        assert_eq!(entry.engine_type, None);
        assert!(map.resolve("101.0").is_resolved());
    }

    #[test]
    fn test_non_numeric_and_short_rows_are_skipped() {
        let grid = vec![
            row("Consist", "Equipment", Some("Engine")),
            row("", "5001", None),
            row("102", "", None),
            vec!["2024-03-01".to_string(), "NEC".to_string(), "103".to_string()],
            row("104", "5004", None),
        ];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());

        assert_eq!(map.len(), 1);
        assert_eq!(map.skipped_rows(), 4);
        assert!(!map.resolve("102").is_resolved());
    }

    #[test]
    fn test_short_row_without_engine_column_is_kept() {
        let grid = vec![vec![
            "d".to_string(),
            "l".to_string(),
            "105".to_string(),
            "o".to_string(),
            "5005".to_string(),
        ]];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());
        assert_eq!(map.resolve("105").value().unwrap().engine_type, None);
    }

    #[test]
    fn test_last_row_wins_and_conflict_is_flagged() {
        let grid = vec![row("101", "5001", None), row("101", "5002", None)];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());

        match map.resolve("101") {
            Resolution::Ambiguous(entry) => assert_eq!(entry.equipment, EquipmentId(5002)),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_identical_rows_are_not_ambiguous() {
        let grid = vec![row("101", "5001", None), row("101", "5001", Some("ALP-46"))];
        let map = TripEquipmentMap::from_grid(&grid, &ConsistLayout::default());

        let resolution = map.resolve("101");
        assert!(!resolution.is_ambiguous());
        assert_eq!(resolution.value().unwrap().engine_type.as_deref(), Some("ALP-46"));
    }
}

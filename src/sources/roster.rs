//! PTC vehicle roster parsing.
//!
//! The roster is a headerless spreadsheet export. Its header row carries a
//! marker cell (by default `Total Alstom`) that separates the left vendor's
//! fleet columns from the right vendor's. Column 0 holds row labels. Data
//! starts a few rows below the header.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{EquipmentId, Resolution, Vendor};

/// Positional layout of the roster grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterLayout {
    pub header_row: usize,
    pub start_row: usize,
    pub boundary_marker: String,
    /// Used when the marker is absent from the header row.
    pub default_boundary_column: usize,
    pub left_vendor: Vendor,
    pub right_vendor: Vendor,
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            header_row: 0,
            start_row: 4,
            boundary_marker: "Total Alstom".to_string(),
            default_boundary_column: 18,
            left_vendor: Vendor::Alstom,
            right_vendor: Vendor::Siemens,
        }
    }
}

/// How the boundary column was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoundarySource {
    Marker,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Boundary {
    pub column: usize,
    pub source: BoundarySource,
}

/// A data cell that was neither blank nor numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCell {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// Equipment id to vendor, last write wins.
///
/// Ids that were written with two different vendors are kept as conflicts;
/// their lookups come back [`Resolution::Ambiguous`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentVendorMap {
    vendors: BTreeMap<EquipmentId, Vendor>,
    conflicts: BTreeSet<EquipmentId>,
}

impl EquipmentVendorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EquipmentId, vendor: Vendor) {
        if let Some(previous) = self.vendors.insert(id, vendor) {
            if previous != vendor {
                self.conflicts.insert(id);
            }
        }
    }

    pub fn get(&self, id: EquipmentId) -> Option<Vendor> {
        self.vendors.get(&id).copied()
    }

    pub fn lookup(&self, id: EquipmentId) -> Resolution<Vendor> {
        match self.vendors.get(&id) {
            Some(&vendor) if self.conflicts.contains(&id) => Resolution::Ambiguous(vendor),
            Some(&vendor) => Resolution::Resolved(vendor),
            None => Resolution::Unresolved,
        }
    }

    /// Number of roster units carrying `vendor`.
    pub fn fleet_size(&self, vendor: Vendor) -> usize {
        self.vendors.values().filter(|&&v| v == vendor).count()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = EquipmentId> + '_ {
        self.conflicts.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipmentId, Vendor)> + '_ {
        self.vendors.iter().map(|(&id, &vendor)| (id, vendor))
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

/// Result of parsing a roster grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterParse {
    pub map: EquipmentVendorMap,
    pub boundary: Boundary,
    pub skipped: Vec<SkippedCell>,
}

/// Finds the vendor boundary column in the header row.
///
/// Falls back to `layout.default_boundary_column` when the marker is absent
/// and reports that through [`BoundarySource::Default`].
///
/// # Errors
///
/// Fails when the grid has no header row or when the chosen column is 0.
/// A default column beyond the widest row is only warned about: no column
/// lies right of it, so the whole grid belongs to the left vendor.
pub fn locate_boundary(grid: &[Vec<String>], layout: &RosterLayout) -> Result<Boundary> {
    let header = grid.get(layout.header_row).ok_or_else(|| {
        Error::roster_layout(
            layout.header_row,
            0,
            format!("roster has {} rows, no header row", grid.len()),
        )
    })?;

    let marker = layout.boundary_marker.trim();
    let boundary = match header.iter().position(|cell| cell.trim() == marker) {
        Some(column) => Boundary {
            column,
            source: BoundarySource::Marker,
        },
        None => {
            warn!(
                marker,
                default_column = layout.default_boundary_column,
                "Boundary marker not found in roster header, using default column"
            );
            Boundary {
                column: layout.default_boundary_column,
                source: BoundarySource::Default,
            }
        }
    };

    if boundary.column == 0 {
        return Err(Error::roster_layout(
            layout.header_row,
            0,
            "boundary cannot be the row-label column",
        ));
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    if boundary.column >= width {
        warn!(
            column = boundary.column,
            width,
            left_vendor = %layout.left_vendor,
            "Default boundary lies beyond the grid, every column is read as the left vendor"
        );
    }

    Ok(boundary)
}

/// Builds the equipment to vendor map from a roster grid.
///
/// Columns `1..boundary` belong to the left vendor and columns after the
/// boundary to the right vendor. Blank cells are ignored; non-numeric cells
/// are skipped and returned in [`RosterParse::skipped`].
#[tracing::instrument(skip_all, fields(rows = grid.len()))]
pub fn parse_roster(grid: &[Vec<String>], layout: &RosterLayout) -> Result<RosterParse> {
    let boundary = locate_boundary(grid, layout)?;
    info!(column = boundary.column, source = ?boundary.source, "Roster boundary located");

    let mut map = EquipmentVendorMap::new();
    let mut skipped = Vec::new();

    for (row_idx, row) in grid.iter().enumerate().skip(layout.start_row) {
        for (col_idx, cell) in row.iter().enumerate().skip(1) {
            let vendor = if col_idx < boundary.column {
                layout.left_vendor
            } else if col_idx > boundary.column {
                layout.right_vendor
            } else {
                continue;
            };

            if cell.trim().is_empty() {
                continue;
            }

            match EquipmentId::from_cell(cell) {
                Some(id) => map.insert(id, vendor),
                None => {
                    debug!(row = row_idx, column = col_idx, value = %cell, "Skipping non-numeric roster cell");
                    skipped.push(SkippedCell {
                        row: row_idx,
                        column: col_idx,
                        value: cell.clone(),
                    });
                }
            }
        }
    }

    for vendor in Vendor::ALL {
        info!(vendor = %vendor, units = map.fleet_size(vendor), "Roster fleet");
    }
    if !map.conflicts.is_empty() {
        warn!(
            conflicts = map.conflicts.len(),
            "Roster lists some units under both vendors, keeping the last"
        );
    }

    Ok(RosterParse {
        map,
        boundary,
        skipped,
    })
}

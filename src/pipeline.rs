//! End-to-end reconciliation run: read the four sources, build the lookup
//! structures, and match the delay log against them.

use tracing::info;

use crate::config::{CauseAllowList, ReferenceConfig};
use crate::error::Result;
use crate::fetch::read_source;
use crate::matcher::{DelayMatcher, MatchOutcome, ReferenceData};
use crate::sources::roster::Boundary;
use crate::sources::{
    RosterParse, ScheduledServiceIndex, Table, TripEquipmentMap, load_delay_log, parse_roster,
    read_grid,
};

/// Locations of the four inputs, as paths or URLs.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub delays: String,
    pub roster: String,
    pub summary: String,
    pub starts: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reference: ReferenceData,
    pub roster_boundary: Boundary,
    pub outcome: MatchOutcome,
    pub delay_rows_skipped: usize,
}

/// Reads and parses the roster only.
pub fn load_roster(source: &str, config: &ReferenceConfig) -> Result<RosterParse> {
    let grid = read_grid(source, &read_source(source)?)?;
    parse_roster(&grid, &config.roster)
}

/// Runs the whole pipeline. Every lookup structure is complete before the
/// first delay is matched.
#[tracing::instrument(skip_all, fields(cause_list = allow_list.version()))]
pub fn run(
    paths: &SourcePaths,
    config: &ReferenceConfig,
    allow_list: &CauseAllowList,
) -> Result<PipelineOutput> {
    let roster = load_roster(&paths.roster, config)?;

    let summary_grid = read_grid(&paths.summary, &read_source(&paths.summary)?)?;
    let consists = TripEquipmentMap::from_grid(&summary_grid, &config.consist);

    let starts = Table::from_bytes(&paths.starts, &read_source(&paths.starts)?)?;
    let schedule = ScheduledServiceIndex::from_table(&starts, &config.schedule_columns)?;

    let delay_table = Table::from_bytes(&paths.delays, &read_source(&paths.delays)?)?;
    let delay_log = load_delay_log(&delay_table, &config.delay_columns)?;

    let reference = ReferenceData {
        roster: roster.map,
        consists,
        schedule,
        calendar: config.calendar(),
    };
    info!(
        roster_units = reference.roster.len(),
        trips = reference.consists.len(),
        scheduled_services = reference.schedule.len(),
        delays = delay_log.records.len(),
        "Reference data ready"
    );

    let outcome = DelayMatcher::new(&reference, allow_list).run(&delay_log.records);

    Ok(PipelineOutput {
        roster_boundary: roster.boundary,
        outcome,
        reference,
        delay_rows_skipped: delay_log.skipped_rows,
    })
}

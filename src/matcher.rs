//! Delay to lead-equipment to vendor matching.
//!
//! Every delay on the cause allow-list is resolved through the consist
//! summary first. Only trips the summary does not know fall back to the
//! scheduled-service index, keyed by the day type of the delay date. The
//! vendor always comes from the roster entry of the resolved unit.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::ServiceCalendar;
use crate::config::CauseAllowList;
use crate::model::{DelayRecord, EnrichedDelayRecord, Resolution};
use crate::sources::{EquipmentVendorMap, ScheduledServiceIndex, TripEquipmentMap};

/// Lookup structures built once before matching.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub roster: EquipmentVendorMap,
    pub consists: TripEquipmentMap,
    pub schedule: ScheduledServiceIndex,
    pub calendar: ServiceCalendar,
}

/// Which source supplied the lead unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeadSource {
    Consist,
    Schedule,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub record: EnrichedDelayRecord,
    pub source: LeadSource,
    /// Some lookup on the way hit a key its source listed with conflicting
    /// values.
    pub ambiguous: bool,
}

/// Counts by resolution path for one matching run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub cause_list: String,
    pub considered: usize,
    pub retained: usize,
    pub via_consist: usize,
    pub via_schedule: usize,
    pub unmatched_trip: usize,
    pub equipment_not_in_roster: usize,
    pub with_vendor: usize,
    pub ambiguous: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub records: Vec<EnrichedDelayRecord>,
    pub summary: MatchSummary,
}

pub struct DelayMatcher<'a> {
    reference: &'a ReferenceData,
    allow_list: &'a CauseAllowList,
}

impl<'a> DelayMatcher<'a> {
    pub fn new(reference: &'a ReferenceData, allow_list: &'a CauseAllowList) -> Self {
        Self {
            reference,
            allow_list,
        }
    }

    pub fn retains(&self, delay: &DelayRecord) -> bool {
        self.allow_list.contains(&delay.cause)
    }

    /// Resolves one delay. Unresolved equipment or vendor is a normal
    /// outcome and leaves the field empty.
    pub fn enrich(&self, delay: &DelayRecord) -> Match {
        let day_type = self.reference.calendar.classify(delay.date);

        let consist = self.reference.consists.resolve(&delay.trip_id);
        let mut ambiguous = consist.is_ambiguous();

        let (lead, engine_type, source) = match consist.value() {
            Some(entry) => (
                Some(entry.equipment),
                entry.engine_type.clone(),
                LeadSource::Consist,
            ),
            None => {
                let fallback = self.reference.schedule.lead(&delay.trip_id, day_type);
                ambiguous |= fallback.is_ambiguous();
                match fallback.value() {
                    Some(id) => (Some(id), None, LeadSource::Schedule),
                    None => (None, None, LeadSource::Unmatched),
                }
            }
        };

        let vendor = match lead {
            Some(id) => self.reference.roster.lookup(id),
            None => Resolution::Unresolved,
        };
        ambiguous |= vendor.is_ambiguous();

        debug!(
            trip_id = %delay.trip_id,
            date = %delay.date,
            day_type = %day_type,
            source = ?source,
            lead = ?lead,
            vendor = ?vendor,
            "Delay matched"
        );

        Match {
            record: EnrichedDelayRecord {
                date: delay.date,
                train_id: delay.trip_id.clone(),
                delay_cause: delay.cause.clone(),
                delay_minutes: delay.duration_minutes,
                lead_equipment: lead,
                ptc_system: vendor.value(),
                engine_type,
                day_of_week: day_type,
            },
            source,
            ambiguous,
        }
    }

    /// Filters `delays` by the allow-list and enriches every retained one.
    ///
    /// The output has exactly one record per retained delay, in input order.
    #[tracing::instrument(skip_all, fields(cause_list = self.allow_list.version(), delays = delays.len()))]
    pub fn run(&self, delays: &[DelayRecord]) -> MatchOutcome {
        let mut summary = MatchSummary {
            cause_list: self.allow_list.version().to_string(),
            considered: delays.len(),
            ..Default::default()
        };
        let mut records = Vec::new();

        for delay in delays.iter().filter(|d| self.retains(d)) {
            let matched = self.enrich(delay);

            summary.retained += 1;
            match matched.source {
                LeadSource::Consist => summary.via_consist += 1,
                LeadSource::Schedule => summary.via_schedule += 1,
                LeadSource::Unmatched => summary.unmatched_trip += 1,
            }
            if matched.record.lead_equipment.is_some() && matched.record.ptc_system.is_none() {
                summary.equipment_not_in_roster += 1;
            }
            if matched.record.ptc_system.is_some() {
                summary.with_vendor += 1;
            }
            if matched.ambiguous {
                summary.ambiguous += 1;
            }

            records.push(matched.record);
        }

        info!(
            considered = summary.considered,
            retained = summary.retained,
            via_consist = summary.via_consist,
            via_schedule = summary.via_schedule,
            unmatched_trip = summary.unmatched_trip,
            equipment_not_in_roster = summary.equipment_not_in_roster,
            with_vendor = summary.with_vendor,
            "Delay matching complete"
        );
        if summary.ambiguous > 0 {
            warn!(
                ambiguous = summary.ambiguous,
                "Some delays resolved through conflicting source entries"
            );
        }

        MatchOutcome { records, summary }
    }
}

/// True when the record's vendor, if any, is the roster vendor of its lead
/// unit.
pub fn vendor_agrees_with_roster(record: &EnrichedDelayRecord, roster: &EquipmentVendorMap) -> bool {
    match (record.ptc_system, record.lead_equipment) {
        (None, _) => true,
        (Some(vendor), Some(id)) => roster.get(id) == Some(vendor),
        (Some(_), None) => false,
    }
}

use crate::analyzers::types::{
    Counterfactual, Coverage, FleetSize, PtcReport, ReportWindow, VendorStats,
};
use crate::analyzers::utility::{counterfactual_reduction, mean, pct, rate};
use crate::model::{EnrichedDelayRecord, EquipmentId, Vendor};
use crate::sources::EquipmentVendorMap;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Aggregates enriched delays into a [`PtcReport`].
///
/// Vendor statistics, the monthly series and the counterfactual only use
/// records inside `window` that reached a vendor. Records without a duration
/// count as delays but add nothing to the minute totals and means. Coverage and the cause
/// breakdown cover every record. Roster fleet sizes come from `roster`.
pub fn aggregate_report(
    records: &[EnrichedDelayRecord],
    window: ReportWindow,
    roster: &EquipmentVendorMap,
    replaced: Vendor,
    replacement: Vendor,
) -> PtcReport {
    let with_vendor = records.iter().filter(|r| r.ptc_system.is_some()).count();
    let coverage = Coverage {
        total: records.len(),
        with_vendor,
        without_vendor: records.len() - with_vendor,
        with_vendor_pct: pct(with_vendor as f64, records.len() as f64),
    };

    let mut causes: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *causes.entry(record.delay_cause.clone()).or_default() += 1;
    }

    let mut events: BTreeMap<Vendor, usize> = BTreeMap::new();
    let mut durations: BTreeMap<Vendor, Vec<f64>> = BTreeMap::new();
    let mut units: BTreeMap<Vendor, BTreeSet<EquipmentId>> = BTreeMap::new();
    let mut monthly: BTreeMap<String, BTreeMap<Vendor, usize>> = BTreeMap::new();

    for record in records.iter().filter(|r| window.contains(r.date)) {
        let Some(vendor) = record.ptc_system else {
            continue;
        };

        *events.entry(vendor).or_default() += 1;
        if let Some(minutes) = record.delay_minutes {
            durations.entry(vendor).or_default().push(minutes);
        }
        if let Some(id) = record.lead_equipment {
            units.entry(vendor).or_default().insert(id);
        }
        *monthly
            .entry(record.date.format("%Y-%m").to_string())
            .or_default()
            .entry(vendor)
            .or_default() += 1;
    }

    let windowed_delays: usize = events.values().sum();
    let roster_total = roster.len();

    let mut vendors = BTreeMap::new();
    for vendor in Vendor::ALL {
        let delays = events.get(&vendor).copied().unwrap_or(0);
        let series = durations.get(&vendor).map(Vec::as_slice).unwrap_or(&[]);
        let observed_units: Vec<EquipmentId> = units
            .get(&vendor)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let fleet = FleetSize {
            observed: observed_units.len(),
            roster: roster.fleet_size(vendor),
        };

        vendors.insert(
            vendor,
            VendorStats {
                delays,
                unmeasured_delays: delays - series.len(),
                total_minutes: series.iter().sum(),
                mean_minutes: mean(series),
                fleet,
                observed_units,
                delays_per_observed_unit: rate(delays, fleet.observed),
                delays_per_roster_unit: rate(delays, fleet.roster),
                share_of_delays_pct: pct(delays as f64, windowed_delays as f64),
                share_of_roster_pct: pct(fleet.roster as f64, roster_total as f64),
            },
        );
    }

    let counterfactual = counterfactual(&vendors, replaced, replacement);

    debug!(
        window = %window,
        windowed_delays,
        coverage = coverage.with_vendor,
        "Report aggregated"
    );

    PtcReport {
        schema_version: 1,
        generated_at: Utc::now(),
        window,
        coverage,
        causes,
        vendors,
        counterfactual,
        monthly,
    }
}

/// Present only when both vendors had at least one windowed delay.
fn counterfactual(
    vendors: &BTreeMap<Vendor, VendorStats>,
    replaced: Vendor,
    replacement: Vendor,
) -> Option<Counterfactual> {
    let from = vendors.get(&replaced)?;
    let to = vendors.get(&replacement)?;
    let replaced_mean = from.mean_minutes?;
    let replacement_mean = to.mean_minutes?;

    let mean_difference = replaced_mean - replacement_mean;
    Some(Counterfactual {
        replaced,
        replacement,
        replaced_delays: from.delays,
        replaced_total_minutes: from.total_minutes,
        replaced_mean_minutes: replaced_mean,
        replacement_mean_minutes: replacement_mean,
        reduction_minutes: counterfactual_reduction(
            from.total_minutes,
            from.delays,
            replacement_mean,
        ),
        mean_difference_minutes: mean_difference,
        mean_difference_pct: pct(mean_difference, replaced_mean),
    })
}

//! Human-readable rendering of a [`PtcReport`].

use std::fmt::Write;

use crate::analyzers::types::{FleetBasis, PtcReport, VendorStats};
use crate::matcher::MatchSummary;
use crate::model::Vendor;

const RULE: &str = "==================================================";

fn hours(minutes: f64) -> f64 {
    minutes / 60.0
}

fn opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

/// How many times more delays per unit `a` has than `b`.
fn per_unit_ratio(a: &VendorStats, b: &VendorStats, basis: FleetBasis) -> Option<f64> {
    let (a, b) = (a.delays_per_unit(basis)?, b.delays_per_unit(basis)?);
    (b > 0.0).then(|| a / b)
}

/// Renders the report answering the vendor comparison questions, with the
/// per-unit rates headlined on `basis`.
pub fn render_text(report: &PtcReport, basis: FleetBasis) -> String {
    let mut out = String::new();
    let window = report.window;
    let empty = VendorStats::default();
    let alstom = report.vendor(Vendor::Alstom).unwrap_or(&empty);
    let siemens = report.vendor(Vendor::Siemens).unwrap_or(&empty);

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "PTC DELAY ANALYSIS ({window})");
    let _ = writeln!(out, "{RULE}");

    match &report.counterfactual {
        Some(cf) => {
            let _ = writeln!(
                out,
                "\n1. Expected reduction if all {} equipment switched to {}:",
                cf.replaced, cf.replacement
            );
            let _ = writeln!(
                out,
                "   {:.1} minutes ({:.1} hours)",
                cf.reduction_minutes,
                hours(cf.reduction_minutes)
            );
            let _ = writeln!(
                out,
                "   ({} avg: {:.1} min, {} avg: {:.1} min)",
                cf.replaced, cf.replaced_mean_minutes, cf.replacement, cf.replacement_mean_minutes
            );
        }
        None => {
            let _ = writeln!(out, "\n1. Expected reduction: n/a (a vendor has no delays in {window})");
        }
    }

    let questions = [(2, 3, Vendor::Alstom, alstom), (4, 5, Vendor::Siemens, siemens)];
    for (fleet_q, delay_q, vendor, stats) in questions {
        let _ = writeln!(
            out,
            "\n{fleet_q}. Pieces of fleet with {vendor} PTC: {}",
            stats.fleet.get(basis)
        );
        let _ = writeln!(
            out,
            "   (roster: {}, observed in delays: {}; headline basis: {basis})",
            stats.fleet.roster, stats.fleet.observed
        );
        if !stats.observed_units.is_empty() {
            let units: Vec<String> = stats.observed_units.iter().map(|id| id.to_string()).collect();
            let _ = writeln!(out, "   Equipment numbers in delays: {}", units.join(", "));
        }
        let _ = writeln!(out, "\n{delay_q}. {vendor} PTC delays in {window}: {}", stats.delays);
        let _ = writeln!(
            out,
            "   Total delay time: {:.1} minutes ({:.1} hours)",
            stats.total_minutes,
            hours(stats.total_minutes)
        );
        if stats.unmeasured_delays > 0 {
            let _ = writeln!(
                out,
                "   ({} of these have no recorded duration and add no minutes)",
                stats.unmeasured_delays
            );
        }
    }

    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "VENDOR COMPARISON");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{:<28}{:>12}{:>12}", "Metric", "Alstom", "Siemens");
    let rows: [(&str, String, String); 6] = [
        ("Delays", alstom.delays.to_string(), siemens.delays.to_string()),
        (
            "Total delay (minutes)",
            format!("{:.1}", alstom.total_minutes),
            format!("{:.1}", siemens.total_minutes),
        ),
        ("Average delay (minutes)", opt(alstom.mean_minutes), opt(siemens.mean_minutes)),
        (
            "Equipment count",
            alstom.fleet.get(basis).to_string(),
            siemens.fleet.get(basis).to_string(),
        ),
        (
            "Delays per equipment",
            opt(alstom.delays_per_unit(basis)),
            opt(siemens.delays_per_unit(basis)),
        ),
        (
            "Share of delays (%)",
            format!("{:.1}", alstom.share_of_delays_pct),
            format!("{:.1}", siemens.share_of_delays_pct),
        ),
    ];
    for (metric, a, s) in rows {
        let _ = writeln!(out, "{metric:<28}{a:>12}{s:>12}");
    }
    if let Some(cf) = &report.counterfactual {
        let _ = writeln!(
            out,
            "Mean difference: {:.1} minutes ({:.1}%)",
            cf.mean_difference_minutes, cf.mean_difference_pct
        );
    }
    if let Some(ratio) = per_unit_ratio(alstom, siemens, basis) {
        let _ = writeln!(
            out,
            "Alstom is {ratio:.1}x more likely to have delays per equipment ({basis} basis)"
        );
    }

    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "COVERAGE");
    let _ = writeln!(out, "{RULE}");
    let coverage = report.coverage;
    let _ = writeln!(out, "Total PTC delays analyzed: {}", coverage.total);
    let _ = writeln!(
        out,
        "Delays with identified equipment: {} ({:.1}%)",
        coverage.with_vendor, coverage.with_vendor_pct
    );
    let _ = writeln!(out, "Delays without equipment match: {}", coverage.without_vendor);

    let _ = writeln!(out, "\nDelay cause breakdown:");
    let mut causes: Vec<(&String, &usize)> = report.causes.iter().collect();
    causes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (cause, count) in causes {
        let _ = writeln!(out, "  {cause}: {count}");
    }

    out
}

/// One-paragraph account of how the delays were resolved.
pub fn render_match_summary(summary: &MatchSummary) -> String {
    format!(
        "Cause list '{}': {} of {} delays retained; lead unit from consist {}, \
         from schedule {}, unmatched {}; {} units not in roster; {} with vendor; {} ambiguous.",
        summary.cause_list,
        summary.retained,
        summary.considered,
        summary.via_consist,
        summary.via_schedule,
        summary.unmatched_trip,
        summary.equipment_not_in_roster,
        summary.with_vendor,
        summary.ambiguous,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate_report;
    use crate::analyzers::types::ReportWindow;
    use crate::model::{DayType, EnrichedDelayRecord, EquipmentId};
    use crate::sources::EquipmentVendorMap;
    use chrono::NaiveDate;

    fn report() -> PtcReport {
        let mut roster = EquipmentVendorMap::new();
        roster.insert(EquipmentId(5001), Vendor::Alstom);
        roster.insert(EquipmentId(5002), Vendor::Alstom);
        roster.insert(EquipmentId(4101), Vendor::Siemens);

        let record = |minutes: f64, id: i64, vendor: Vendor| EnrichedDelayRecord {
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            train_id: "1".to_string(),
            delay_cause: "NJT PTC".to_string(),
            delay_minutes: Some(minutes),
            lead_equipment: Some(EquipmentId(id)),
            ptc_system: Some(vendor),
            engine_type: None,
            day_of_week: DayType::Weekday,
        };
        let records = vec![
            record(30.0, 5001, Vendor::Alstom),
            record(60.0, 5001, Vendor::Alstom),
            record(20.0, 4101, Vendor::Siemens),
        ];
        aggregate_report(
            &records,
            ReportWindow::year(2024).unwrap(),
            &roster,
            Vendor::Alstom,
            Vendor::Siemens,
        )
    }

    #[test]
    fn test_render_answers_questions() {
        let text = render_text(&report(), FleetBasis::Roster);

        assert!(text.contains("PTC DELAY ANALYSIS (2024)"));
        // 90 - 2 * 20
        assert!(text.contains("   50.0 minutes (0.8 hours)"));
        assert!(text.contains("2. Pieces of fleet with Alstom PTC: 2"));
        assert!(text.contains("3. Alstom PTC delays in 2024: 2"));
        assert!(text.contains("4. Pieces of fleet with Siemens PTC: 1"));
        assert!(text.contains("5. Siemens PTC delays in 2024: 1"));
        assert!(text.contains("  NJT PTC: 3"));
    }

    #[test]
    fn test_render_lists_units_and_per_unit_ratio() {
        let text = render_text(&report(), FleetBasis::Roster);
        assert!(text.contains("   Equipment numbers in delays: 5001\n"));
        assert!(text.contains("   Equipment numbers in delays: 4101\n"));
        // Alstom 2 delays over 2 roster units, Siemens 1 over 1
        assert!(text.contains("Alstom is 1.0x more likely to have delays per equipment (roster basis)"));

        let text = render_text(&report(), FleetBasis::Observed);
        // Alstom 2 delays on 1 observed unit, Siemens 1 on 1
        assert!(text.contains("Alstom is 2.0x more likely to have delays per equipment (observed basis)"));
    }

    #[test]
    fn test_render_notes_delays_without_duration() {
        let mut report = report();
        if let Some(stats) = report.vendors.get_mut(&Vendor::Alstom) {
            stats.unmeasured_delays = 1;
        }
        let text = render_text(&report, FleetBasis::Roster);
        assert!(text.contains("(1 of these have no recorded duration and add no minutes)"));
    }

    #[test]
    fn test_render_uses_fleet_basis() {
        let text = render_text(&report(), FleetBasis::Observed);
        assert!(text.contains("2. Pieces of fleet with Alstom PTC: 1"));
        assert!(text.contains("headline basis: observed"));
    }

    #[test]
    fn test_render_without_counterfactual() {
        let mut report = report();
        report.counterfactual = None;
        let text = render_text(&report, FleetBasis::Roster);
        assert!(text.contains("Expected reduction: n/a"));
    }

    #[test]
    fn test_render_match_summary() {
        let summary = MatchSummary {
            cause_list: "current".to_string(),
            considered: 10,
            retained: 4,
            via_consist: 2,
            via_schedule: 1,
            unmatched_trip: 1,
            equipment_not_in_roster: 0,
            with_vendor: 3,
            ambiguous: 0,
        };
        let text = render_match_summary(&summary);
        assert!(text.starts_with("Cause list 'current': 4 of 10 delays retained"));
    }
}

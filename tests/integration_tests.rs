use ptc_delay_matcher::analyzers::aggregate::aggregate_report;
use ptc_delay_matcher::analyzers::types::ReportWindow;
use ptc_delay_matcher::config::{CURRENT_CAUSE_LIST, LEGACY_CAUSE_LIST, ReferenceConfig};
use ptc_delay_matcher::matcher::vendor_agrees_with_roster;
use ptc_delay_matcher::model::{DayType, EquipmentId, Vendor};
use ptc_delay_matcher::output::{read_results, write_records};
use ptc_delay_matcher::pipeline::{self, PipelineOutput, SourcePaths};
use ptc_delay_matcher::sources::roster::BoundarySource;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn paths() -> SourcePaths {
    SourcePaths {
        delays: fixture("delays.csv"),
        roster: fixture("roster.csv"),
        summary: fixture("summary.csv"),
        starts: fixture("starts.csv"),
    }
}

fn run_with(cause_list: &str) -> PipelineOutput {
    let config = ReferenceConfig::default();
    let allow_list = config.allow_list(cause_list).expect("known cause list");
    pipeline::run(&paths(), &config, &allow_list).expect("pipeline runs on fixtures")
}

#[test]
fn test_full_pipeline() {
    let run = run_with(CURRENT_CAUSE_LIST);

    assert_eq!(run.roster_boundary.column, 3);
    assert_eq!(run.roster_boundary.source, BoundarySource::Marker);
    assert_eq!(run.delay_rows_skipped, 1);
    assert_eq!(run.reference.consists.len(), 2);
    assert_eq!(run.reference.consists.skipped_rows(), 2);

    let summary = &run.outcome.summary;
    assert_eq!(summary.considered, 8);
    assert_eq!(summary.retained, 6);
    assert_eq!(summary.via_consist, 2);
    assert_eq!(summary.via_schedule, 3);
    assert_eq!(summary.unmatched_trip, 1);
    assert_eq!(summary.equipment_not_in_roster, 1);
    assert_eq!(summary.with_vendor, 4);
    assert_eq!(summary.ambiguous, 0);

    let records = &run.outcome.records;
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| r.delay_cause.starts_with("NJT PTC")));
    assert!(
        records
            .iter()
            .all(|r| vendor_agrees_with_roster(r, &run.reference.roster))
    );
}

#[test]
fn test_consist_takes_precedence_over_schedule() {
    let run = run_with(CURRENT_CAUSE_LIST);
    let first = &run.outcome.records[0];

    // starts.csv plans 4102 for trip 101, the summary says 5001 led it
    assert_eq!(first.train_id, "101");
    assert_eq!(first.lead_equipment, Some(EquipmentId(5001)));
    assert_eq!(first.ptc_system, Some(Vendor::Alstom));
    assert_eq!(first.engine_type.as_deref(), Some("ALP-46"));
}

#[test]
fn test_schedule_fallback_uses_day_type() {
    let run = run_with(CURRENT_CAUSE_LIST);
    let records = &run.outcome.records;

    let saturday = &records[1];
    assert_eq!(saturday.day_of_week, DayType::Saturday);
    assert_eq!(saturday.lead_equipment, Some(EquipmentId(5002)));
    assert_eq!(saturday.ptc_system, Some(Vendor::Alstom));
    assert_eq!(saturday.engine_type, None);

    let weekday = &records[2];
    assert_eq!(weekday.day_of_week, DayType::Weekday);
    assert_eq!(weekday.lead_equipment, Some(EquipmentId(4101)));
    assert_eq!(weekday.ptc_system, Some(Vendor::Siemens));

    let holiday = records
        .iter()
        .find(|r| r.train_id == "303")
        .expect("holiday delay retained");
    assert_eq!(holiday.day_of_week, DayType::SundayOrHoliday);
    assert_eq!(holiday.lead_equipment, Some(EquipmentId(9999)));
    assert_eq!(holiday.ptc_system, None);
}

#[test]
fn test_unmatched_trip_is_kept_empty() {
    let run = run_with(CURRENT_CAUSE_LIST);
    let unmatched = run
        .outcome
        .records
        .iter()
        .find(|r| r.train_id == "999")
        .expect("unmatched delay retained");

    assert_eq!(unmatched.lead_equipment, None);
    assert_eq!(unmatched.ptc_system, None);
    assert_eq!(unmatched.engine_type, None);
}

#[test]
fn test_legacy_cause_list() {
    let run = run_with(LEGACY_CAUSE_LIST);
    let causes: Vec<_> = run
        .outcome
        .records
        .iter()
        .map(|r| r.delay_cause.as_str())
        .collect();

    assert_eq!(causes, vec!["NJT PTC MECHANICAL", "NJ PTC"]);
    assert_eq!(run.outcome.summary.cause_list, LEGACY_CAUSE_LIST);
}

#[test]
fn test_report_over_fixtures() {
    let run = run_with(CURRENT_CAUSE_LIST);
    let report = aggregate_report(
        &run.outcome.records,
        ReportWindow::year(2024).unwrap(),
        &run.reference.roster,
        Vendor::Alstom,
        Vendor::Siemens,
    );

    assert_eq!(report.coverage.total, 6);
    assert_eq!(report.coverage.with_vendor, 4);
    assert_eq!(report.coverage.without_vendor, 2);

    let alstom = report.vendor(Vendor::Alstom).unwrap();
    assert_eq!(alstom.delays, 2);
    assert_eq!(alstom.total_minutes, 18.0);
    assert_eq!(alstom.mean_minutes, Some(9.0));
    assert_eq!(alstom.fleet.observed, 2);
    assert_eq!(alstom.fleet.roster, 3);

    let siemens = report.vendor(Vendor::Siemens).unwrap();
    assert_eq!(siemens.delays, 1);
    assert_eq!(siemens.mean_minutes, Some(4.0));
    assert_eq!(siemens.fleet.observed, 1);
    assert_eq!(siemens.fleet.roster, 2);

    // 18 - 2 * 4
    let cf = report.counterfactual.expect("both vendors have delays");
    assert_eq!(cf.reduction_minutes, 10.0);

    assert_eq!(report.monthly["2024-03"][&Vendor::Alstom], 2);
    assert_eq!(report.monthly["2024-03"][&Vendor::Siemens], 1);
}

#[test]
fn test_results_file_reaggregates_identically() {
    let run = run_with(CURRENT_CAUSE_LIST);
    let bytes = write_records("mem", Vec::new(), &run.outcome.records).unwrap();
    let restored = read_results("mem", &bytes).unwrap();

    assert_eq!(restored, run.outcome.records);
}

#[test]
fn test_missing_source_fails() {
    let config = ReferenceConfig::default();
    let allow_list = config.allow_list(CURRENT_CAUSE_LIST).unwrap();
    let mut paths = paths();
    paths.starts = fixture("no_such_starts.csv");

    let err = pipeline::run(&paths, &config, &allow_list).unwrap_err();
    assert!(err.to_string().contains("no_such_starts.csv"));
}

//! Command-level tests against temporary exports.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use care_cli::cli::{Cli, Command, InputArgs, InspectArgs, OutputFormatArg, ResolveArgs};
use care_cli::commands::{emit, render_report, run_inspect, run_resolve};
use care_cli::report::{format_millis, key_listing};
use tempfile::NamedTempFile;

const EXPORT: &str = "name,id number,admission date,address,hospital,notes\n\
                      Ann,110101199001011234,2023-01-05,12 Main St,North,first visit\n\
                      Bo,,2023-02-01,9 Elm Rd,East,\n\
                      Ann,110101199001011234,2023-03-01,12 Main St,South,\n";

fn export_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(EXPORT.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn input(path: &Path) -> InputArgs {
    InputArgs {
        file: path.to_path_buf(),
        header_rows: 1,
        delimiter: ',',
        no_fuzzy_headers: false,
    }
}

fn resolve_args(path: &Path) -> ResolveArgs {
    ResolveArgs {
        input: input(path),
        presort: false,
        min_evidence: None,
        strict: false,
        import_timestamp: None,
        format: OutputFormatArg::Table,
        output: None,
    }
}

#[test]
fn resolve_groups_rows_and_rolls_up_admissions() {
    let file = export_file();

    let report = run_resolve(&resolve_args(file.path())).unwrap();

    insta::assert_snapshot!(key_listing(&report.patients), @r"
    110101199001011234 | Ann | 2 | 2
    Bo | Bo | 1 | 1
    ");
    let ann = &report.patients[0];
    assert_eq!(format_millis(ann.first_admission_at).as_deref(), Some("2023-01-05"));
    assert_eq!(format_millis(ann.latest_admission_at).as_deref(), Some("2023-03-01"));
    assert_eq!(ann.latest_hospital, "South");
    insta::assert_json_snapshot!(report.stats, @r#"
    {
      "records_seen": 3,
      "records_attached": 3,
      "records_dropped": 0,
      "id_matches": 1,
      "name_matches": 0,
      "key_matches": 0,
      "groups_created": 2,
      "rekeys": 0
    }
    "#);
}

#[test]
fn summary_projection_snapshot() {
    let file = export_file();

    let report = run_resolve(&resolve_args(file.path())).unwrap();

    insta::assert_json_snapshot!(report.patients[1], @r#"
    {
      "key": "Bo",
      "patient_name": "Bo",
      "gender": "",
      "birth_date": "",
      "native_place": "",
      "ethnicity": "",
      "id_number": "",
      "admission_count": 1,
      "member_count": 1,
      "first_admission_at": 1675209600000,
      "first_diagnosis": "",
      "first_hospital": "East",
      "latest_admission_at": 1675209600000,
      "latest_diagnosis": "",
      "latest_hospital": "East",
      "latest_doctor": "",
      "caregivers": "",
      "family_contacts": [],
      "address": "9 Elm Rd",
      "family_economics": ""
    }
    "#);
}

#[test]
fn undated_rows_leave_the_rollup_alone_and_runs_repeat() {
    let csv = "name,id number,admission date,hospital,diagnosis\n\
               Ann,110101199001011234,2023-01-05,North,flu\n\
               Ann,110101199001011234,,,\n";
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    file.flush().unwrap();
    let args = resolve_args(file.path());

    let first = run_resolve(&args).unwrap();
    let second = run_resolve(&args).unwrap();

    assert_eq!(first.patients, second.patients);
    assert_eq!(first.stats, second.stats);
    let ann = &first.patients[0];
    assert_eq!(ann.member_count, 2);
    assert_eq!(ann.admission_count, 1);
    assert_eq!(format_millis(ann.latest_admission_at).as_deref(), Some("2023-01-05"));
    assert_eq!(ann.latest_diagnosis, "flu");
    assert_eq!(ann.latest_hospital, "North");
}

#[test]
fn explicit_import_timestamp_dates_undated_rows() {
    let csv = "name,hospital\nBo,East\n";
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    file.flush().unwrap();
    let cli = Cli::try_parse_from([
        "care-link",
        "resolve",
        file.path().to_str().unwrap(),
        "--import-timestamp",
        "2024-03-01",
    ])
    .unwrap();
    let Command::Resolve(args) = cli.command else {
        panic!("expected resolve command");
    };

    let report = run_resolve(&args).unwrap();

    let bo = &report.patients[0];
    assert_eq!(bo.admission_count, 1);
    assert_eq!(format_millis(bo.latest_admission_at).as_deref(), Some("2024-03-01"));
    assert_eq!(bo.latest_hospital, "East");
}

#[test]
fn unparseable_import_timestamp_is_rejected() {
    let result = Cli::try_parse_from([
        "care-link",
        "resolve",
        "intake.csv",
        "--import-timestamp",
        "someday",
    ]);
    assert!(result.is_err());
}

#[test]
fn json_output_is_written_to_file() {
    let file = export_file();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("patients.json");
    let report = run_resolve(&resolve_args(file.path())).unwrap();

    let rendered = render_report(&report, OutputFormatArg::Json).unwrap();
    emit(&rendered, Some(&output)).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["patients"].as_array().map(Vec::len), Some(2));
    assert_eq!(written["stats"]["records_seen"], 3);
    assert_eq!(written["patients"][1]["key"], "Bo");
}

#[test]
fn table_output_lists_every_patient() {
    let file = export_file();
    let report = run_resolve(&resolve_args(file.path())).unwrap();

    let rendered = render_report(&report, OutputFormatArg::Table).unwrap();

    assert!(rendered.contains("110101199001011234"));
    assert!(rendered.contains("Bo"));
    assert!(rendered.contains("TOTAL"));
    assert!(rendered.contains("Groups created"));
}

#[test]
fn inspect_reports_unmapped_headers() {
    let file = export_file();

    let mapping = run_inspect(&InspectArgs {
        input: input(file.path()),
    })
    .unwrap();

    assert_eq!(mapping.unmapped, vec!["notes".to_string()]);
    assert_eq!(mapping.matches.len(), 5);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");

    let error = run_resolve(&resolve_args(&path)).unwrap_err();

    assert!(format!("{error:#}").contains("absent.csv"));
}

#[test]
fn parses_resolve_flags() {
    let cli = Cli::try_parse_from([
        "care-link",
        "resolve",
        "intake.csv",
        "--min-evidence",
        "1",
        "--presort",
        "--format",
        "json",
    ])
    .unwrap();

    let Command::Resolve(args) = cli.command else {
        panic!("expected resolve command");
    };
    assert_eq!(args.min_evidence, Some(1));
    assert!(args.presort);
    assert!(args.format == OutputFormatArg::Json);
}

#[test]
fn strict_conflicts_with_min_evidence() {
    let result = Cli::try_parse_from([
        "care-link",
        "resolve",
        "intake.csv",
        "--strict",
        "--min-evidence",
        "2",
    ]);
    assert!(result.is_err());
}

#[test]
fn min_evidence_is_bounded() {
    let result = Cli::try_parse_from(["care-link", "resolve", "intake.csv", "--min-evidence", "4"]);
    assert!(result.is_err());
}

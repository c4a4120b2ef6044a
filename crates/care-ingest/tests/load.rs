//! File-level ingestion tests.

use std::io::Write;

use care_ingest::{CanonicalField, IngestError, IngestOptions, load_records};
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_chinese_csv_export() {
    let csv = "\u{feff}姓名,身份证号,入院日期,家庭住址,陪护人\n\
               张三,110101199001011234,2023-01-05,北京市朝阳区,父亲、母亲\n\
               ,,,,\n\
               张三,,2023/03/01,北京市朝阳区,母亲，姑姑\n";
    let file = temp_file(".csv", csv.as_bytes());

    let extraction = load_records(file.path(), &IngestOptions::default()).unwrap();

    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.skipped_rows, 1);
    assert!(extraction.mapping.unmapped.is_empty());
    assert_eq!(extraction.records[0].caregivers, "父亲、母亲");
    assert_eq!(extraction.records[1].import_order, Some(3));
}

#[test]
fn loads_json_export_with_wrapper() {
    let json = r#"{"records": [
        {"patientName": "Li Si", "idNumber": "11010119900101123x", "admissionTimestamp": 1700000000000},
        {"patientName": "Li Si", "address": "Main St"}
    ]}"#;
    let file = temp_file(".json", json.as_bytes());

    let extraction = load_records(file.path(), &IngestOptions::default()).unwrap();

    assert!(extraction.mapping.has_field(CanonicalField::AdmissionTimestamp));
    assert_eq!(extraction.records[0].admission_timestamp, Some(1_700_000_000_000));
    assert_eq!(extraction.records[1].address, "Main St");
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_records(&dir.path().join("absent.csv"), &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn oversized_file_is_rejected() {
    let file = temp_file(".csv", b"name\nA\nB\n");
    let options = IngestOptions {
        max_file_size: 4,
        ..IngestOptions::default()
    };
    let err = load_records(file.path(), &options).unwrap_err();
    assert!(matches!(err, IngestError::FileTooLarge { max_size: 4, .. }));
}

#[test]
fn semicolon_delimited_export() {
    let file = temp_file(".csv", "name;gender\nWang Wu;M\n".as_bytes());
    let options = IngestOptions::default().with_delimiter(b';');
    let extraction = load_records(file.path(), &options).unwrap();
    assert_eq!(extraction.records[0].gender, "M");
}

#[test]
fn gb18030_export_is_decoded() {
    let (encoded, _, _) = encoding_rs::GB18030.encode("姓名,性别,家庭住址\n李四,女,上海市浦东新区\n");
    let file = temp_file(".csv", &encoded);

    let extraction = load_records(file.path(), &IngestOptions::default()).unwrap();

    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.records[0].patient_name, "李四");
    assert_eq!(extraction.records[0].address, "上海市浦东新区");
}

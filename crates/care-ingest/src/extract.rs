//! Row-to-record extraction.

use care_model::RawRecord;
use care_normalize::{TimestampValue, normalize_timestamp, normalize_value};
use serde::Serialize;

use crate::fields::{CanonicalField, HeaderMapping, map_headers};
use crate::options::IngestOptions;
use crate::source::{SourceRow, SourceTable, SourceValue};

/// Records extracted from one table plus the header report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub mapping: HeaderMapping,
    /// Rows dropped because every mapped cell was empty.
    pub skipped_rows: usize,
}

/// Map headers and extract one [`RawRecord`] per non-blank row.
///
/// Rows without an import order column take their 1-based data row number.
pub fn extract_records(table: &SourceTable, options: &IngestOptions) -> Extraction {
    let mapping = map_headers(&table.headers, options.fuzzy_threshold);
    if !mapping.unmapped.is_empty() {
        tracing::debug!(unmapped = ?mapping.unmapped, "headers without a field");
    }
    if !mapping.has_field(CanonicalField::PatientName) {
        tracing::warn!("no patient name column found; every row will be dropped by the resolver");
    }

    let mut records = Vec::with_capacity(table.rows.len());
    let mut skipped_rows = 0;
    for row in &table.rows {
        let record = extract_row(row, &mapping, options);
        if record.is_blank() {
            skipped_rows += 1;
            continue;
        }
        records.push(record);
    }

    tracing::info!(
        rows = table.rows.len(),
        records = records.len(),
        skipped = skipped_rows,
        mapped_columns = mapping.matches.len(),
        "extracted intake records"
    );
    Extraction {
        records,
        mapping,
        skipped_rows,
    }
}

/// Extract a single row with a precomputed mapping.
pub fn extract_row(row: &SourceRow, mapping: &HeaderMapping, options: &IngestOptions) -> RawRecord {
    let mut record = RawRecord::default();
    for found in &mapping.matches {
        let Some(value) = row.get(found.column) else {
            continue;
        };
        apply_value(&mut record, found.field, value);
    }
    if record.is_blank() {
        return record;
    }
    if record.import_order.is_none() {
        record.import_order = i64::try_from(row.row_number).ok();
    }
    if record.import_timestamp.is_none() {
        record.import_timestamp = options.import_timestamp;
    }
    record
}

fn apply_value(record: &mut RawRecord, field: CanonicalField, value: &SourceValue) {
    if field.is_timestamp() {
        let millis = timestamp_cell(value);
        let slot = match field {
            CanonicalField::AdmissionTimestamp => &mut record.admission_timestamp,
            CanonicalField::ImportTimestamp => &mut record.import_timestamp,
            CanonicalField::UpdatedAt => &mut record.updated_at,
            CanonicalField::CreatedAt => &mut record.created_at,
            other => unreachable!("{other} is not a timestamp field"),
        };
        *slot = millis;
        return;
    }
    if field == CanonicalField::ImportOrder {
        record.import_order = order_cell(value);
        return;
    }

    let text = normalize_value(&value.to_text());
    let slot = match field {
        CanonicalField::RecordKey => &mut record.record_key,
        CanonicalField::PatientName => &mut record.patient_name,
        CanonicalField::IdNumber => &mut record.id_number,
        CanonicalField::Gender => &mut record.gender,
        CanonicalField::BirthDate => &mut record.birth_date,
        CanonicalField::NativePlace => &mut record.native_place,
        CanonicalField::Ethnicity => &mut record.ethnicity,
        CanonicalField::AdmissionDate => &mut record.admission_date,
        CanonicalField::Hospital => &mut record.hospital,
        CanonicalField::Diagnosis => &mut record.diagnosis,
        CanonicalField::Doctor => &mut record.doctor,
        CanonicalField::Symptoms => &mut record.symptoms,
        CanonicalField::TreatmentProcess => &mut record.treatment_process,
        CanonicalField::FollowUpPlan => &mut record.follow_up_plan,
        CanonicalField::Address => &mut record.address,
        CanonicalField::FatherInfo => &mut record.father_info,
        CanonicalField::MotherInfo => &mut record.mother_info,
        CanonicalField::OtherGuardian => &mut record.other_guardian,
        CanonicalField::Caregivers => &mut record.caregivers,
        CanonicalField::FamilyEconomics => &mut record.family_economics,
        CanonicalField::AdmissionTimestamp
        | CanonicalField::ImportTimestamp
        | CanonicalField::UpdatedAt
        | CanonicalField::CreatedAt
        | CanonicalField::ImportOrder => return,
    };
    *slot = text;
}

fn timestamp_cell(value: &SourceValue) -> Option<i64> {
    match value {
        SourceValue::Number(millis) => normalize_timestamp(TimestampValue::Millis(*millis)),
        SourceValue::Text(text) => normalize_timestamp(TimestampValue::Text(text)),
        SourceValue::Null => None,
    }
}

fn order_cell(value: &SourceValue) -> Option<i64> {
    match value {
        SourceValue::Number(number) if number.is_finite() => Some(number.trunc() as i64),
        SourceValue::Text(text) => normalize_value(text).parse().ok(),
        _ => None,
    }
}

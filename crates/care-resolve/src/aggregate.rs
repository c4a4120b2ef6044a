//! Admission rollup maintained per group as records attach.

use std::cmp::Reverse;

use care_model::{AdmissionRollup, RawRecord};
use care_normalize::{TimestampValue, normalize_timestamp, normalize_value};

/// Resolve the timestamp a record counts toward.
///
/// Cascades through the explicit admission timestamp, the parsed admission
/// date text, the import timestamp, then the update and create timestamps.
/// A missing or unparseable stage advances to the next; `None` means none
/// of them resolved.
pub fn admission_timestamp(record: &RawRecord) -> Option<i64> {
    record
        .admission_timestamp
        .or_else(|| normalize_timestamp(TimestampValue::Text(&record.admission_date)))
        .or(record.import_timestamp)
        .or(record.updated_at)
        .or(record.created_at)
}

/// Fold one attached record into the rollup.
///
/// Records without a resolvable timestamp do not count as admissions.
/// First-admission fields move only on a strictly earlier timestamp and
/// latest-admission fields only on a strictly later one, so the earliest
/// attached record wins ties.
pub fn record_admission(rollup: &mut AdmissionRollup, record: &RawRecord) {
    let Some(timestamp) = admission_timestamp(record) else {
        return;
    };
    rollup.count += 1;

    if rollup.first_admission_at.is_none_or(|first| timestamp < first) {
        rollup.first_admission_at = Some(timestamp);
        rollup.first_diagnosis = normalize_value(&record.diagnosis);
        rollup.first_hospital = normalize_value(&record.hospital);
    }
    if rollup.latest_admission_at.is_none_or(|latest| timestamp > latest) {
        rollup.latest_admission_at = Some(timestamp);
        rollup.latest_diagnosis = normalize_value(&record.diagnosis);
        rollup.latest_hospital = normalize_value(&record.hospital);
        rollup.latest_doctor = normalize_value(&record.doctor);
    }
}

/// Order members most recent first.
///
/// Sorts descending by resolved timestamp (unknown sorts as zero), then by
/// descending import order. The sort is stable, so fully tied records keep
/// their attachment order.
pub fn sort_members(records: &mut [RawRecord]) {
    records.sort_by_cached_key(|record| {
        (
            Reverse(admission_timestamp(record).unwrap_or(0)),
            Reverse(record.import_order.unwrap_or(0)),
        )
    });
}

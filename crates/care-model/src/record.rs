//! Raw intake records.
//!
//! A [`RawRecord`] is one spreadsheet row or caregiver submission after the
//! field extractor has mapped its columns onto the canonical shape. Text
//! fields use the empty string for "not provided"; timestamps are epoch
//! milliseconds and `None` means "unknown", never zero.

use serde::{Deserialize, Serialize};

/// One intake row after field mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Upstream record key (archive number, declared patient key).
    pub record_key: String,
    /// Patient display name as written on the row.
    pub patient_name: String,
    /// Identity-document number as written on the row.
    pub id_number: String,
    pub gender: String,
    /// Birth date text, kept verbatim.
    pub birth_date: String,
    pub native_place: String,
    pub ethnicity: String,
    /// Admission date text, parsed lazily by the aggregator.
    pub admission_date: String,
    /// Explicit admission timestamp (epoch millis).
    pub admission_timestamp: Option<i64>,
    /// Timestamp of the import job that produced the row.
    pub import_timestamp: Option<i64>,
    pub updated_at: Option<i64>,
    pub created_at: Option<i64>,
    pub hospital: String,
    pub diagnosis: String,
    /// Attending clinician.
    pub doctor: String,
    pub symptoms: String,
    pub treatment_process: String,
    pub follow_up_plan: String,
    pub address: String,
    /// Free text describing the father ("张伟 13912345678 ...").
    pub father_info: String,
    pub mother_info: String,
    pub other_guardian: String,
    /// Free-text caregiver list ("父亲、母亲").
    pub caregivers: String,
    pub family_economics: String,
    /// Position of the row within its import batch.
    pub import_order: Option<i64>,
    /// Group key written back by the resolver.
    pub group_key: Option<String>,
}

impl RawRecord {
    /// Create a record carrying only a patient name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            patient_name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the group key this record was resolved into, if any.
    pub fn group_key(&self) -> Option<&str> {
        self.group_key.as_deref()
    }

    /// Returns true when no field carries any content.
    pub fn is_blank(&self) -> bool {
        let texts = [
            &self.record_key,
            &self.patient_name,
            &self.id_number,
            &self.gender,
            &self.birth_date,
            &self.native_place,
            &self.ethnicity,
            &self.admission_date,
            &self.hospital,
            &self.diagnosis,
            &self.doctor,
            &self.symptoms,
            &self.treatment_process,
            &self.follow_up_plan,
            &self.address,
            &self.father_info,
            &self.mother_info,
            &self.other_guardian,
            &self.caregivers,
            &self.family_economics,
        ];
        texts.iter().all(|text| text.trim().is_empty())
            && self.admission_timestamp.is_none()
            && self.import_timestamp.is_none()
            && self.updated_at.is_none()
            && self.created_at.is_none()
    }
}

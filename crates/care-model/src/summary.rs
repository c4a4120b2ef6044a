//! Flat read-model projection of a patient group.

use serde::{Deserialize, Serialize};

use crate::contact::FamilyContact;

/// Storage-ready summary of one [`PatientGroup`](crate::PatientGroup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub key: String,
    pub patient_name: String,
    pub gender: String,
    pub birth_date: String,
    pub native_place: String,
    pub ethnicity: String,
    pub id_number: String,
    pub admission_count: usize,
    pub member_count: usize,
    pub first_admission_at: Option<i64>,
    pub first_diagnosis: String,
    pub first_hospital: String,
    pub latest_admission_at: Option<i64>,
    pub latest_diagnosis: String,
    pub latest_hospital: String,
    pub latest_doctor: String,
    pub caregivers: String,
    pub family_contacts: Vec<FamilyContact>,
    pub address: String,
    pub family_economics: String,
}

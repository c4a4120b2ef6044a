//! Canonical patient groups.
//!
//! A [`PatientGroup`] is created the first time a record cannot be attached
//! to any existing group and is mutated by every record attached to it after
//! that. Groups are never merged with each other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::contact::{ContactRole, FamilyContact};
use crate::record::RawRecord;

/// Where a group's key was derived from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKeySource {
    /// Normalized identity-document number.
    IdNumber,
    /// Sanitized upstream record key.
    RecordKey,
    /// Sanitized patient name.
    PatientName,
    /// Hash of the normalized key text (non-ASCII names).
    Hash,
    /// Time-and-counter token; the only non-deterministic source.
    Generated,
}

impl GroupKeySource {
    /// Identity numbers become the permanent key once discovered.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::IdNumber)
    }
}

/// First and latest care episodes of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRollup {
    /// Number of member records with a resolvable admission timestamp.
    pub count: usize,
    pub first_admission_at: Option<i64>,
    pub first_diagnosis: String,
    pub first_hospital: String,
    pub latest_admission_at: Option<i64>,
    pub latest_diagnosis: String,
    pub latest_hospital: String,
    pub latest_doctor: String,
}

/// Name, phone and identity tokens seen for one parent role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactTokens {
    pub names: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub id_numbers: BTreeSet<String>,
}

impl ContactTokens {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.phones.is_empty() && self.id_numbers.is_empty()
    }

    /// Any shared name, phone or identity token.
    pub fn intersects(&self, other: &ContactTokens) -> bool {
        !self.names.is_disjoint(&other.names)
            || !self.phones.is_disjoint(&other.phones)
            || !self.id_numbers.is_disjoint(&other.id_numbers)
    }

    pub fn is_superset(&self, other: &ContactTokens) -> bool {
        self.names.is_superset(&other.names)
            && self.phones.is_superset(&other.phones)
            && self.id_numbers.is_superset(&other.id_numbers)
    }

    pub fn extend(&mut self, other: &ContactTokens) {
        self.names.extend(other.names.iter().cloned());
        self.phones.extend(other.phones.iter().cloned());
        self.id_numbers.extend(other.id_numbers.iter().cloned());
    }
}

/// Evidence accumulated from every record merged into a group.
///
/// Only grows during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceIndex {
    pub addresses: BTreeSet<String>,
    pub father: ContactTokens,
    pub mother: ContactTokens,
}

impl EvidenceIndex {
    /// Tokens for a parent role; guardians carry no evidence.
    pub fn parent(&self, role: ContactRole) -> Option<&ContactTokens> {
        match role {
            ContactRole::Father => Some(&self.father),
            ContactRole::Mother => Some(&self.mother),
            ContactRole::Guardian => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.father.is_empty() && self.mother.is_empty()
    }

    pub fn is_superset(&self, other: &EvidenceIndex) -> bool {
        self.addresses.is_superset(&other.addresses)
            && self.father.is_superset(&other.father)
            && self.mother.is_superset(&other.mother)
    }
}

/// Working indices consulted during resolution only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndices {
    /// Every normalized identity number attached to the group.
    pub id_numbers: BTreeSet<String>,
    /// Every name-key seen for the group.
    pub name_keys: BTreeSet<String>,
    pub evidence: EvidenceIndex,
}

impl GroupIndices {
    pub fn is_empty(&self) -> bool {
        self.id_numbers.is_empty() && self.name_keys.is_empty() && self.evidence.is_empty()
    }
}

/// The canonical patient entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientGroup {
    pub key: String,
    pub key_source: GroupKeySource,
    /// Longest normalized name variant seen.
    pub patient_name: String,
    pub gender: String,
    pub birth_date: String,
    pub native_place: String,
    pub ethnicity: String,
    /// First identity number seen for the group.
    pub id_number: String,
    pub caregivers: String,
    pub family_contacts: Vec<FamilyContact>,
    pub address: String,
    pub family_economics: String,
    pub admission: AdmissionRollup,
    /// Smallest import order among member records.
    pub import_order: Option<i64>,
    /// Member records; most recent first once finalized.
    pub records: Vec<RawRecord>,
    /// Resolution-only state, emptied by [`PatientGroup::finalize`].
    #[serde(skip)]
    pub indices: GroupIndices,
}

impl PatientGroup {
    /// Create an empty group under the given key.
    pub fn new(key: impl Into<String>, key_source: GroupKeySource) -> Self {
        Self {
            key: key.into(),
            key_source,
            patient_name: String::new(),
            gender: String::new(),
            birth_date: String::new(),
            native_place: String::new(),
            ethnicity: String::new(),
            id_number: String::new(),
            caregivers: String::new(),
            family_contacts: Vec::new(),
            address: String::new(),
            family_economics: String::new(),
            admission: AdmissionRollup::default(),
            import_order: None,
            records: Vec::new(),
            indices: GroupIndices::default(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.records.len()
    }

    /// The record treated as most recent by downstream readers.
    pub fn latest_record(&self) -> Option<&RawRecord> {
        self.records.first()
    }

    /// Drop the working indices and stamp the final key on every member.
    pub fn finalize(&mut self) {
        self.indices = GroupIndices::default();
        for record in &mut self.records {
            record.group_key = Some(self.key.clone());
        }
    }
}

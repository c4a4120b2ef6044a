//! Evidence tokens and name-candidate adjudication.
//!
//! Evidence categories are the address, the father contact and the mother
//! contact. A category is *available* when the incoming record carries it
//! and *matched* when it overlaps the candidate group's accumulated tokens.

use care_model::{
    ContactRole, ContactTokens, EvidenceIndex, FamilyContact, RawRecord, ResolverOptions,
};
use care_normalize::{extract_contact, name_key, normalize_spacing};

/// Evidence carried by a single record.
pub fn record_evidence(record: &RawRecord) -> EvidenceIndex {
    let mut evidence = EvidenceIndex::default();
    let address = normalize_spacing(&record.address);
    if !address.is_empty() {
        evidence.addresses.insert(address);
    }
    if let Some(contact) = extract_contact(ContactRole::Father, &record.father_info) {
        evidence.father = contact_tokens(&contact);
    }
    if let Some(contact) = extract_contact(ContactRole::Mother, &record.mother_info) {
        evidence.mother = contact_tokens(&contact);
    }
    evidence
}

/// Name, phone and identity tokens of one contact.
///
/// A name that is only the raw text echoed back next to an identifier is
/// not a name token.
pub fn contact_tokens(contact: &FamilyContact) -> ContactTokens {
    let mut tokens = ContactTokens::default();
    if let Some(phone) = &contact.phone {
        tokens.phones.insert(phone.clone());
    }
    if let Some(id_number) = &contact.id_number {
        tokens.id_numbers.insert(id_number.clone());
    }
    let has_identifier = !tokens.phones.is_empty() || !tokens.id_numbers.is_empty();
    let echoed = contact.name == contact.raw && has_identifier;
    let key = name_key(&contact.name);
    if !echoed && !key.is_empty() {
        tokens.names.insert(key);
    }
    tokens
}

/// Category counts from comparing a record against a candidate group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvidenceCheck {
    /// Categories present on the incoming record.
    pub available: usize,
    /// Available categories that overlap the candidate.
    pub matched: usize,
    /// Available categories for which the candidate already holds tokens.
    pub contested: usize,
}

impl EvidenceCheck {
    /// At least `min(available, cap)` categories overlap, and at least one is available.
    pub fn passes(&self, options: &ResolverOptions) -> bool {
        self.available > 0 && self.matched >= options.required_matches(self.available)
    }

    /// Neither side can contradict the other: the record offers nothing, or
    /// the candidate has nothing recorded in any category the record offers.
    pub fn is_undisputed(&self) -> bool {
        self.contested == 0
    }
}

/// Compare incoming evidence against a candidate's accumulated index.
pub fn compare_evidence(candidate: &EvidenceIndex, incoming: &EvidenceIndex) -> EvidenceCheck {
    let mut check = EvidenceCheck::default();
    if !incoming.addresses.is_empty() {
        check.available += 1;
        if !candidate.addresses.is_empty() {
            check.contested += 1;
        }
        if !candidate.addresses.is_disjoint(&incoming.addresses) {
            check.matched += 1;
        }
    }
    for role in [ContactRole::Father, ContactRole::Mother] {
        let (Some(theirs), Some(ours)) = (candidate.parent(role), incoming.parent(role)) else {
            continue;
        };
        if ours.is_empty() {
            continue;
        }
        check.available += 1;
        if !theirs.is_empty() {
            check.contested += 1;
        }
        if theirs.intersects(ours) {
            check.matched += 1;
        }
    }
    check
}

/// Grow `target` with every token of `incoming`.
pub fn absorb_evidence(target: &mut EvidenceIndex, incoming: &EvidenceIndex) {
    target.addresses.extend(incoming.addresses.iter().cloned());
    target.father.extend(&incoming.father);
    target.mother.extend(&incoming.mother);
}

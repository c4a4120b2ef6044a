//! Working state of one resolution pass.
//!
//! [`ResolutionState`] owns the groups of a pass together with the three
//! lookup tables the matching rules consult:
//!
//! - the key table, the single authoritative `group key -> group` map
//! - the identity index, `identity number -> group`
//! - the name index, `name-key -> groups` in creation order
//!
//! Each group carries its own evidence index. A state is built fresh for
//! every pass and never shared between passes.

use std::collections::{BTreeMap, HashMap};

use care_model::{
    ContactRole, EvidenceIndex, GroupKeySource, PatientGroup, PatientSummary, RawRecord,
    ResolverOptions, redact_value,
};
use care_normalize::{
    extract_contact, merge_caregivers, name_key, normalize_id_number, normalize_spacing,
    normalize_value,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::aggregate::{record_admission, sort_members};
use crate::evidence::{absorb_evidence, compare_evidence, record_evidence};
use crate::key::{create_stable_key, declared_key, disambiguate};
use crate::summary::project_summary;

/// Which rule attached a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Identity number already attached to a group.
    IdNumber,
    /// Same name-key, accepted on evidence or as an undisputed candidate.
    NameEvidence,
    /// Upstream record key already registered as a group key.
    DeclaredKey,
    /// Nothing matched; a new group was created.
    NewGroup,
}

/// Counters collected during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub records_seen: usize,
    pub records_attached: usize,
    /// Records without a usable patient name.
    pub records_dropped: usize,
    pub id_matches: usize,
    pub name_matches: usize,
    pub key_matches: usize,
    pub groups_created: usize,
    /// Groups whose key moved to an identity number mid-pass.
    pub rekeys: usize,
}

impl ResolutionStats {
    fn count(&mut self, rule: MatchRule) {
        self.records_attached += 1;
        match rule {
            MatchRule::IdNumber => self.id_matches += 1,
            MatchRule::NameEvidence => self.name_matches += 1,
            MatchRule::DeclaredKey => self.key_matches += 1,
            MatchRule::NewGroup => self.groups_created += 1,
        }
    }
}

/// Finalized output of a pass: groups in creation order plus counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub groups: Vec<PatientGroup>,
    pub stats: ResolutionStats,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, key: &str) -> Option<&PatientGroup> {
        self.groups.iter().find(|group| group.key == key)
    }

    /// Group keys in creation order.
    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.key.as_str()).collect()
    }

    /// Summaries in creation order.
    pub fn summaries(&self) -> Vec<PatientSummary> {
        self.groups.iter().map(project_summary).collect()
    }

    /// Groups keyed by their final key.
    pub fn into_map(self) -> BTreeMap<String, PatientGroup> {
        self.groups
            .into_iter()
            .map(|group| (group.key.clone(), group))
            .collect()
    }
}

/// Normalized view of an incoming record used by the matching rules.
struct Incoming {
    name: String,
    name_key: String,
    id_number: String,
    declared_key: Option<String>,
    evidence: EvidenceIndex,
}

impl Incoming {
    fn from_record(record: &RawRecord) -> Self {
        Self {
            name: normalize_spacing(&record.patient_name),
            name_key: name_key(&record.patient_name),
            id_number: normalize_id_number(&record.id_number),
            declared_key: declared_key(record),
            evidence: record_evidence(record),
        }
    }
}

/// Mutable state of a single resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    options: ResolverOptions,
    groups: Vec<PatientGroup>,
    key_table: HashMap<String, usize>,
    id_index: HashMap<String, usize>,
    name_index: HashMap<String, Vec<usize>>,
    stats: ResolutionStats,
}

impl ResolutionState {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in creation order, working indices included.
    pub fn groups(&self) -> &[PatientGroup] {
        &self.groups
    }

    /// Look up a group by its current key.
    pub fn group(&self, key: &str) -> Option<&PatientGroup> {
        self.key_table.get(key).map(|&index| &self.groups[index])
    }

    /// Group that currently owns an identity number.
    pub fn group_for_id(&self, id_number: &str) -> Option<&PatientGroup> {
        self.id_index
            .get(&normalize_id_number(id_number))
            .map(|&index| &self.groups[index])
    }

    /// Assign one record to a new or existing group.
    ///
    /// Returns the key of the group the record joined, as of this record;
    /// a later record can still move that group to an identity-number key.
    /// Records without a usable patient name are dropped and yield `None`.
    pub fn ingest(&mut self, mut record: RawRecord) -> Option<String> {
        self.stats.records_seen += 1;
        let incoming = Incoming::from_record(&record);
        if incoming.name_key.is_empty() {
            self.stats.records_dropped += 1;
            trace!(import_order = ?record.import_order, "dropping record without patient name");
            return None;
        }

        let (index, rule) = match self.find_group(&incoming) {
            Some(found) => found,
            None => (self.create_group(&record), MatchRule::NewGroup),
        };
        self.stats.count(rule);
        trace!(
            ?rule,
            patient = %redact_value(&incoming.name),
            group = index,
            "record attached"
        );

        if !incoming.id_number.is_empty() {
            self.register_id(index, &incoming.id_number);
        }
        let key = self.groups[index].key.clone();
        self.attach(index, &incoming, &record);
        record.group_key = Some(key.clone());
        self.groups[index].records.push(record);
        Some(key)
    }

    /// Move a group from `old_key` to `new_key` in the key table.
    ///
    /// Returns false without changing anything when `old_key` is unknown or
    /// `new_key` already belongs to another group; the earlier entry keeps
    /// its key.
    pub fn rekey(&mut self, old_key: &str, new_key: &str) -> bool {
        if old_key == new_key {
            return self.key_table.contains_key(old_key);
        }
        if self.key_table.contains_key(new_key) {
            debug!("rekey target already occupied; keeping existing key");
            return false;
        }
        let Some(index) = self.key_table.remove(old_key) else {
            return false;
        };
        self.key_table.insert(new_key.to_string(), index);
        let group = &mut self.groups[index];
        group.key = new_key.to_string();
        for member in &mut group.records {
            member.group_key = Some(new_key.to_string());
        }
        self.stats.rekeys += 1;
        true
    }

    /// Finalize every group: rollups are already current, members are
    /// sorted most recent first and working indices are discarded.
    pub fn finish(self) -> Resolution {
        let mut groups = self.groups;
        for group in &mut groups {
            sort_members(&mut group.records);
            group.finalize();
        }
        Resolution {
            groups,
            stats: self.stats,
        }
    }

    fn find_group(&self, incoming: &Incoming) -> Option<(usize, MatchRule)> {
        if let Some(&index) = self.id_index.get(&incoming.id_number) {
            return Some((index, MatchRule::IdNumber));
        }
        if let Some(index) = self.name_candidate(incoming) {
            return Some((index, MatchRule::NameEvidence));
        }
        incoming
            .declared_key
            .as_ref()
            .and_then(|key| self.key_table.get(key))
            .map(|&index| (index, MatchRule::DeclaredKey))
    }

    /// Pick among groups that have seen this name-key.
    ///
    /// A record carrying an identity number needs an evidence match and
    /// skips groups already holding a different identity number. A record
    /// without one prefers an evidence match and otherwise takes the first
    /// candidate whose evidence cannot contradict it.
    ///
    /// Creation order only breaks ties within each of those two tiers; an
    /// evidence match later in the list beats an earlier undisputed group.
    fn name_candidate(&self, incoming: &Incoming) -> Option<usize> {
        let candidates = self.name_index.get(&incoming.name_key)?;
        let mut undisputed = None;
        for &index in candidates {
            let indices = &self.groups[index].indices;
            let has_id = !incoming.id_number.is_empty();
            if has_id
                && !indices.id_numbers.is_empty()
                && !indices.id_numbers.contains(&incoming.id_number)
            {
                continue;
            }
            let check = compare_evidence(&indices.evidence, &incoming.evidence);
            if check.passes(&self.options) {
                return Some(index);
            }
            if !has_id && undisputed.is_none() && check.is_undisputed() {
                undisputed = Some(index);
            }
        }
        undisputed
    }

    fn create_group(&mut self, record: &RawRecord) -> usize {
        let (base, source) = create_stable_key(record);
        let key = disambiguate(&base, |candidate| self.key_table.contains_key(candidate));
        if key != base {
            debug!(?source, "derived group key already taken; appending suffix");
        }
        let index = self.groups.len();
        self.key_table.insert(key.clone(), index);
        self.groups.push(PatientGroup::new(key, source));
        index
    }

    /// Register an identity number and promote a weaker key to it.
    fn register_id(&mut self, index: usize, id_number: &str) {
        self.id_index.entry(id_number.to_string()).or_insert(index);
        let group = &mut self.groups[index];
        group.indices.id_numbers.insert(id_number.to_string());
        if group.id_number.is_empty() {
            group.id_number = id_number.to_string();
        }
        if group.key_source.is_permanent() {
            return;
        }
        let old_key = group.key.clone();
        if self.rekey(&old_key, id_number) {
            self.groups[index].key_source = GroupKeySource::IdNumber;
            debug!(group = index, "group promoted to identity-number key");
        }
    }

    /// Fold the record's fields and evidence into the group.
    fn attach(&mut self, index: usize, incoming: &Incoming, record: &RawRecord) {
        let group = &mut self.groups[index];
        if group.indices.name_keys.insert(incoming.name_key.clone()) {
            self.name_index
                .entry(incoming.name_key.clone())
                .or_default()
                .push(index);
        }
        absorb_evidence(&mut group.indices.evidence, &incoming.evidence);

        group.caregivers = merge_caregivers(&group.caregivers, &record.caregivers);
        fill_if_unset(&mut group.gender, &record.gender);
        fill_if_unset(&mut group.birth_date, &record.birth_date);
        fill_if_unset(&mut group.native_place, &record.native_place);
        fill_if_unset(&mut group.ethnicity, &record.ethnicity);
        fill_if_unset(&mut group.address, &record.address);
        fill_if_unset(&mut group.family_economics, &record.family_economics);

        for (role, text) in [
            (ContactRole::Father, &record.father_info),
            (ContactRole::Mother, &record.mother_info),
            (ContactRole::Guardian, &record.other_guardian),
        ] {
            if let Some(contact) = extract_contact(role, text)
                && !group.family_contacts.iter().any(|known| known.same_person(&contact))
            {
                group.family_contacts.push(contact);
            }
        }

        if incoming.name.chars().count() > group.patient_name.chars().count() {
            group.patient_name = incoming.name.clone();
        }
        if let Some(order) = record.import_order {
            group.import_order =
                Some(group.import_order.map_or(order, |current| current.min(order)));
        }
        record_admission(&mut group.admission, record);
    }
}

fn fill_if_unset(slot: &mut String, value: &str) {
    if slot.is_empty() {
        let value = normalize_value(value);
        if !value.is_empty() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_id(name: &str, id_number: &str) -> RawRecord {
        RawRecord {
            id_number: id_number.to_string(),
            ..RawRecord::named(name)
        }
    }

    #[test]
    fn name_only_group_is_promoted_to_identity_key() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        let first = state
            .ingest(RawRecord {
                address: "12 Main St".to_string(),
                ..RawRecord::named("Li Si")
            })
            .unwrap();
        assert_eq!(first, "LiSi");

        let second = state
            .ingest(RawRecord {
                address: "12 Main St".to_string(),
                ..with_id("Li Si", "110101199001011234")
            })
            .unwrap();

        assert_eq!(second, "110101199001011234");
        assert_eq!(state.len(), 1);
        assert!(state.group("LiSi").is_none());
        let group = state.group("110101199001011234").unwrap();
        assert_eq!(group.key_source, GroupKeySource::IdNumber);
        assert!(
            group
                .records
                .iter()
                .all(|record| record.group_key() == Some("110101199001011234"))
        );
        assert_eq!(state.stats().rekeys, 1);
    }

    #[test]
    fn evidence_match_beats_earlier_undisputed_candidate() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        let beijing = state
            .ingest(RawRecord {
                address: "北京市朝阳区".to_string(),
                ..RawRecord::named("王五")
            })
            .unwrap();
        let shanghai = state
            .ingest(RawRecord {
                address: "上海市浦东新区".to_string(),
                father_info: "王大 13800000000".to_string(),
                ..RawRecord::named("王五")
            })
            .unwrap();
        assert_ne!(beijing, shanghai);

        let joined = state
            .ingest(RawRecord {
                father_info: "13800000000".to_string(),
                ..RawRecord::named("王五")
            })
            .unwrap();

        assert_eq!(joined, shanghai);
        assert_eq!(state.group(&beijing).unwrap().member_count(), 1);
        assert_eq!(state.group(&shanghai).unwrap().member_count(), 2);
    }

    #[test]
    fn identity_without_evidence_does_not_join_name_group() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        state.ingest(RawRecord::named("Li Si"));
        state.ingest(with_id("Li Si", "110101199001011234"));
        assert_eq!(state.len(), 2);
        assert!(state.group("LiSi").is_some());
        assert!(state.group_for_id("110101199001011234").is_some());
    }

    #[test]
    fn rekey_keeps_earlier_occupant() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        state.ingest(RawRecord::named("Alpha"));
        state.ingest(RawRecord::named("Beta"));
        assert!(!state.rekey("Beta", "Alpha"));
        assert_eq!(state.group("Alpha").unwrap().patient_name, "Alpha");
        assert_eq!(state.group("Beta").unwrap().patient_name, "Beta");
        assert!(!state.rekey("Gamma", "Delta"));
        assert!(state.rekey("Beta", "Beta-1"));
        assert!(state.group("Beta").is_none());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn record_without_name_is_dropped() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        assert!(state.ingest(with_id("  ", "110101199001011234")).is_none());
        assert!(state.ingest(RawRecord::named("undefined")).is_none());
        assert!(state.is_empty());
        assert_eq!(state.stats().records_dropped, 2);
        assert!(state.group_for_id("110101199001011234").is_none());
    }

    #[test]
    fn conflicting_identity_blocks_name_match() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        let shared = RawRecord {
            address: "北京市朝阳区".to_string(),
            father_info: "王大 13800000000".to_string(),
            ..with_id("王五", "110101199001011234")
        };
        let other = RawRecord {
            id_number: "110101199202022222".to_string(),
            ..shared.clone()
        };
        state.ingest(shared);
        state.ingest(other);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn declared_key_matches_existing_group() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        let first = RawRecord {
            record_key: "P-001".to_string(),
            address: "北京市朝阳区".to_string(),
            ..RawRecord::named("张三")
        };
        let renamed = RawRecord {
            record_key: "P-001".to_string(),
            address: "上海市".to_string(),
            ..RawRecord::named("张小三")
        };
        assert_eq!(state.ingest(first).as_deref(), Some("P-001"));
        assert_eq!(state.ingest(renamed).as_deref(), Some("P-001"));
        assert_eq!(state.stats().key_matches, 1);
        assert_eq!(state.group("P-001").unwrap().patient_name, "张小三");
    }

    #[test]
    fn scalar_fields_keep_first_value() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        state.ingest(RawRecord {
            gender: "null".to_string(),
            ethnicity: "汉族".to_string(),
            ..with_id("张三", "110101199001011234")
        });
        state.ingest(RawRecord {
            gender: "男".to_string(),
            ethnicity: "回族".to_string(),
            ..with_id("张三", "110101199001011234")
        });
        let group = state.group("110101199001011234").unwrap();
        assert_eq!(group.gender, "男");
        assert_eq!(group.ethnicity, "汉族");
    }

    #[test]
    fn family_contacts_are_deduplicated() {
        let mut state = ResolutionState::new(ResolverOptions::default());
        for father in ["张伟 13912345678", "张 伟 13912345678", "张强"] {
            state.ingest(RawRecord {
                father_info: father.to_string(),
                ..with_id("张三", "110101199001011234")
            });
        }
        let group = state.group("110101199001011234").unwrap();
        assert_eq!(group.family_contacts.len(), 2);
        assert_eq!(group.family_contacts[0].name, "张伟");
    }
}

//! Persistence collaborator for patient summaries.
//!
//! The resolver does no I/O. Callers hand its summaries to a
//! [`SummaryStore`] through [`persist_summaries`], which writes every
//! summary by key and then removes stored summaries that share a display
//! name with this pass but whose key the pass did not produce.

use std::collections::{BTreeMap, BTreeSet};

use care_model::{PatientSummary, redact_value};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused a write because its own state changed underneath it.
    #[error("conflicting write for summary {key}")]
    Conflict { key: String },

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for patient summaries keyed by group key.
pub trait SummaryStore {
    /// Insert or replace the summary stored under `summary.key`.
    fn upsert(&mut self, summary: &PatientSummary) -> Result<()>;

    /// Delete summaries named `patient_name` whose key is not in `keep`.
    ///
    /// Returns the number of summaries removed.
    fn remove_stale_duplicates(
        &mut self,
        patient_name: &str,
        keep: &BTreeSet<String>,
    ) -> Result<usize>;
}

/// Counts from one [`persist_summaries`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub upserted: usize,
    pub removed: usize,
}

/// Write a pass's summaries, then clear stale same-name entries.
///
/// Stops at the first store error; summaries written before it stay written.
pub fn persist_summaries<S>(store: &mut S, summaries: &[PatientSummary]) -> Result<PersistReport>
where
    S: SummaryStore + ?Sized,
{
    let mut report = PersistReport::default();
    let mut keys_by_name: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for summary in summaries {
        store.upsert(summary)?;
        report.upserted += 1;
        keys_by_name
            .entry(summary.patient_name.as_str())
            .or_default()
            .insert(summary.key.clone());
    }
    for (name, keep) in &keys_by_name {
        let removed = store.remove_stale_duplicates(name, keep)?;
        if removed > 0 {
            debug!(patient = %redact_value(name), removed, "removed stale duplicate summaries");
        }
        report.removed += removed;
    }
    Ok(report)
}

/// In-memory [`SummaryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    summaries: BTreeMap<String, PatientSummary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PatientSummary> {
        self.summaries.get(key)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.summaries.keys().map(String::as_str)
    }

    pub fn summaries(&self) -> impl Iterator<Item = &PatientSummary> {
        self.summaries.values()
    }
}

impl SummaryStore for MemoryStore {
    fn upsert(&mut self, summary: &PatientSummary) -> Result<()> {
        self.summaries.insert(summary.key.clone(), summary.clone());
        Ok(())
    }

    fn remove_stale_duplicates(
        &mut self,
        patient_name: &str,
        keep: &BTreeSet<String>,
    ) -> Result<usize> {
        let before = self.summaries.len();
        self.summaries
            .retain(|key, summary| summary.patient_name != patient_name || keep.contains(key));
        Ok(before - self.summaries.len())
    }
}

#[cfg(test)]
mod tests {
    use care_model::{GroupKeySource, PatientGroup};

    use super::*;
    use crate::summary::project_summary;

    fn summary(key: &str, name: &str) -> PatientSummary {
        let mut group = PatientGroup::new(key, GroupKeySource::RecordKey);
        group.patient_name = name.to_string();
        project_summary(&group)
    }

    #[test]
    fn persist_replaces_stale_same_name_entries() {
        let mut store = MemoryStore::new();
        persist_summaries(&mut store, &[summary("LiSi", "Li Si"), summary("WangWu", "Wang Wu")])
            .unwrap();

        let report =
            persist_summaries(&mut store, &[summary("110101199001011234", "Li Si")]).unwrap();

        assert_eq!(report, PersistReport { upserted: 1, removed: 1 });
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["110101199001011234", "WangWu"]);
    }

    #[test]
    fn upsert_overwrites_by_key() {
        let mut store = MemoryStore::new();
        store.upsert(&summary("k", "A")).unwrap();
        store.upsert(&summary("k", "B")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").unwrap().patient_name, "B");
    }

    struct FailingStore;

    impl SummaryStore for FailingStore {
        fn upsert(&mut self, summary: &PatientSummary) -> Result<()> {
            Err(StoreError::Conflict {
                key: summary.key.clone(),
            })
        }

        fn remove_stale_duplicates(&mut self, _: &str, _: &BTreeSet<String>) -> Result<usize> {
            Err(StoreError::Backend("unreachable".to_string()))
        }
    }

    #[test]
    fn store_errors_propagate() {
        let err = persist_summaries(&mut FailingStore, &[summary("k", "A")]).unwrap_err();
        assert_eq!(err.to_string(), "conflicting write for summary k");
    }
}

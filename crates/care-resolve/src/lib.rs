//! Patient identity resolution and aggregation.
//!
//! One deterministic forward pass assigns each [`RawRecord`] to at most one
//! patient group, in rule order:
//!
//! 1. **Identity number** already attached to a group
//! 2. **Name-key** candidate accepted on address/parent evidence
//! 3. **Declared record key** already registered as a group key
//! 4. **New group** under the strongest available key
//!
//! Groups are never merged with each other. Each attached record updates the
//! group's admission rollup; finalized groups project to [`PatientSummary`]
//! values for storage.
//!
//! [`RawRecord`]: care_model::RawRecord
//! [`PatientSummary`]: care_model::PatientSummary

pub mod aggregate;
pub mod evidence;
pub mod key;
pub mod resolver;
pub mod state;
pub mod store;
pub mod summary;

pub use aggregate::{admission_timestamp, record_admission, sort_members};
pub use evidence::{EvidenceCheck, compare_evidence, record_evidence};
pub use key::{create_stable_key, declared_key, disambiguate, hash_key, sha256_hex};
pub use resolver::{presort, resolve, resolve_into};
pub use state::{MatchRule, Resolution, ResolutionState, ResolutionStats};
pub use store::{MemoryStore, PersistReport, StoreError, SummaryStore, persist_summaries};
pub use summary::{project_summaries, project_summary};

//! Data model for the patient identity resolution engine.
//!
//! - [`RawRecord`]: one intake row after field mapping
//! - [`PatientGroup`]: the canonical patient entity built during resolution
//! - [`PatientSummary`]: the flat read-model projected from a group

pub mod contact;
pub mod group;
pub mod options;
pub mod record;
pub mod redact;
pub mod summary;

pub use contact::{ContactRole, FamilyContact};
pub use group::{
    AdmissionRollup, ContactTokens, EvidenceIndex, GroupIndices, GroupKeySource, PatientGroup,
};
pub use options::{EVIDENCE_CATEGORY_COUNT, InputOrder, ResolverOptions};
pub use record::RawRecord;
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data};
pub use summary::PatientSummary;

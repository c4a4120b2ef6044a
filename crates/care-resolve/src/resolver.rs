//! The single-pass resolution entry points.
//!
//! Clustering is order dependent when identity numbers are missing: evidence
//! accumulates as records attach, so the same records in a different order
//! can group differently. [`InputOrder::Presorted`] applies a stable sort by
//! identity number, declared key and name-key first, which makes the outcome
//! independent of how the export happened to be ordered.

use std::time::Instant;

use care_model::{InputOrder, RawRecord, ResolverOptions};
use care_normalize::{name_key, normalize_id_number, normalize_spacing};
use tracing::{info, info_span};

use crate::state::{Resolution, ResolutionState};

/// Resolve records into finalized patient groups.
///
/// Never fails: records without a usable name are dropped and counted,
/// unparseable timestamps are treated as unknown.
pub fn resolve(records: Vec<RawRecord>, options: &ResolverOptions) -> Resolution {
    let span = info_span!("resolve", records = records.len());
    let _guard = span.enter();
    let start = Instant::now();

    let mut state = ResolutionState::new(options.clone());
    resolve_into(records, &mut state);
    let resolution = state.finish();

    let stats = &resolution.stats;
    info!(
        records_seen = stats.records_seen,
        records_dropped = stats.records_dropped,
        groups = resolution.len(),
        id_matches = stats.id_matches,
        name_matches = stats.name_matches,
        key_matches = stats.key_matches,
        rekeys = stats.rekeys,
        duration_ms = start.elapsed().as_millis(),
        "resolution complete"
    );
    resolution
}

/// Feed records into an existing state, honoring its input order option.
pub fn resolve_into(mut records: Vec<RawRecord>, state: &mut ResolutionState) {
    if state.options().input_order == InputOrder::Presorted {
        presort(&mut records);
    }
    for record in records {
        state.ingest(record);
    }
}

/// Stable sort: records with identity numbers first, ordered by identity
/// number, then declared record key, then name-key.
pub fn presort(records: &mut [RawRecord]) {
    records.sort_by_cached_key(|record| {
        let id_number = normalize_id_number(&record.id_number);
        let record_key = normalize_spacing(&record.record_key);
        (
            id_number.is_empty(),
            id_number,
            record_key.is_empty(),
            record_key,
            name_key(&record.patient_name),
        )
    });
}

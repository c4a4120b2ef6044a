//! Stable group key derivation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use care_model::{GroupKeySource, RawRecord};
use care_normalize::{normalize_id_number, normalize_spacing, sanitize_key};
use sha2::Digest;

/// Prefix of hash-derived keys.
pub const HASH_KEY_PREFIX: &str = "patient-";

/// Hex characters of the digest kept in a hash-derived key.
const HASH_KEY_LENGTH: usize = 16;

static GENERATED_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Deterministic key for text with no ASCII-safe characters.
pub fn hash_key(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let digest = sha256_hex(text.as_bytes());
    Some(format!("{HASH_KEY_PREFIX}{}", &digest[..HASH_KEY_LENGTH]))
}

/// Time and counter token; the only non-deterministic key.
pub fn generated_key() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let sequence = GENERATED_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{HASH_KEY_PREFIX}{millis:x}-{sequence}")
}

/// ASCII-safe key for arbitrary text, or its hash when nothing survives.
fn text_key(text: &str) -> Option<(String, bool)> {
    let text = normalize_spacing(text);
    let sanitized = sanitize_key(&text);
    if !sanitized.is_empty() {
        return Some((sanitized, false));
    }
    hash_key(&text).map(|key| (key, true))
}

/// Key under which a record declares itself, from its upstream record key.
///
/// Patient names are not declared keys: two unrelated patients can share a
/// name, and a name-derived lookup would merge them without evidence.
pub fn declared_key(record: &RawRecord) -> Option<String> {
    text_key(&record.record_key).map(|(key, _)| key)
}

/// Derive the key for a new group from the strongest identifier available.
///
/// Identity number, then declared record key, then patient name, each
/// sanitized to `[A-Za-z0-9_-]`; text with no ASCII-safe characters is
/// hashed; a generated token is the last resort.
pub fn create_stable_key(record: &RawRecord) -> (String, GroupKeySource) {
    let id_number = normalize_id_number(&record.id_number);
    if !id_number.is_empty() {
        return (id_number, GroupKeySource::IdNumber);
    }
    if let Some((key, hashed)) = text_key(&record.record_key) {
        let source = if hashed {
            GroupKeySource::Hash
        } else {
            GroupKeySource::RecordKey
        };
        return (key, source);
    }
    if let Some((key, hashed)) = text_key(&record.patient_name) {
        let source = if hashed {
            GroupKeySource::Hash
        } else {
            GroupKeySource::PatientName
        };
        return (key, source);
    }
    (generated_key(), GroupKeySource::Generated)
}

/// First of `base`, `base-2`, `base-3`, … for which `taken` is false.
pub fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2usize..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(generated_key)
}

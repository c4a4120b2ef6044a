//! Normalization primitives for patient intake data.
//!
//! Everything here is pure and infallible:
//!
//! - **Values**: trimming, placeholder removal, whitespace collapsing, timestamp parsing
//! - **Contacts**: phone / identity number / name extraction from free text
//! - **Caregivers**: delimiter-aware list merging
//! - **Identity keys**: name-keys, identity numbers, ASCII-safe key text

pub mod caregiver;
pub mod contact;
pub mod identity;
pub mod value;

pub use caregiver::{CAREGIVER_DELIMITERS, CAREGIVER_JOINER, merge_caregivers, split_caregivers};
pub use contact::{extract_contact, find_id_number, find_phone};
pub use identity::{name_key, normalize_id_number, normalize_phone, sanitize_key};
pub use value::{
    TimestampValue, millis_from_number, normalize_optional, normalize_spacing,
    normalize_timestamp, normalize_value, parse_timestamp_text,
};

//! Intake ingestion for the identity resolution engine.
//!
//! Turns spreadsheet and JSON exports into canonical [`RawRecord`]s:
//!
//! - **Reading**: CSV (UTF-8 or GB18030) and JSON row arrays
//! - **Header mapping**: Chinese and English aliases plus fuzzy matching
//! - **Extraction**: placeholder cleanup, timestamp parsing, import order
//!
//! [`RawRecord`]: care_model::RawRecord

pub mod error;
pub mod extract;
pub mod fields;
pub mod options;
pub mod reader;
pub mod source;

use std::path::Path;

pub use error::{IngestError, Result};
pub use extract::{Extraction, extract_records, extract_row};
pub use fields::{CanonicalField, HeaderMapping, HeaderMatch, MatchKind, map_headers, normalize_header};
pub use options::{DEFAULT_FUZZY_THRESHOLD, IngestOptions, MAX_INPUT_FILE_SIZE};
pub use reader::{InputFormat, decode_text, parse_csv, parse_json, read_table};
pub use source::{SourceRow, SourceTable, SourceValue};

/// Read a file and extract its records in one step.
pub fn load_records(path: &Path, options: &IngestOptions) -> Result<Extraction> {
    let table = read_table(path, options)?;
    tracing::debug!(path = %path.display(), rows = table.row_count(), "loaded intake table");
    Ok(extract_records(&table, options))
}

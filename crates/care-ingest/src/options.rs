//! Options controlling intake ingestion.

use serde::{Deserialize, Serialize};

/// Maximum input size accepted by default (500 MB).
pub const MAX_INPUT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Minimum Jaro-Winkler similarity for a fuzzy header match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.92;

/// Options for reading and mapping an intake export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Rows at the top of a CSV that form the header block.
    ///
    /// The last one holds the column names; earlier ones are title rows and
    /// are skipped.
    pub header_rows: usize,

    /// CSV field delimiter.
    pub delimiter: u8,

    /// Similarity threshold for fuzzy header matching; `None` disables it.
    pub fuzzy_threshold: Option<f64>,

    /// Reject files larger than this many bytes.
    pub max_file_size: u64,

    /// Import-job timestamp stamped on rows that do not carry one.
    pub import_timestamp: Option<i64>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            header_rows: 1,
            delimiter: b',',
            fuzzy_threshold: Some(DEFAULT_FUZZY_THRESHOLD),
            max_file_size: MAX_INPUT_FILE_SIZE,
            import_timestamp: None,
        }
    }
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact alias matches only.
    pub fn strict() -> Self {
        Self {
            fuzzy_threshold: None,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header_rows(mut self, rows: usize) -> Self {
        self.header_rows = rows.max(1);
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: Option<f64>) -> Self {
        self.fuzzy_threshold = threshold.map(|value| value.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_import_timestamp(mut self, millis: i64) -> Self {
        self.import_timestamp = Some(millis);
        self
    }
}

//! Reading intake exports into [`SourceTable`]s.
//!
//! CSV exports may be UTF-8 (with or without a byte-order mark) or GB18030,
//! which is what spreadsheet software on Chinese-locale systems writes by
//! default. UTF-16 is rejected. JSON input is an array of row objects, or an
//! object wrapping one under `records`, `rows` or `data`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use encoding_rs::GB18030;
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::options::IngestOptions;
use crate::source::{SourceRow, SourceTable, SourceValue};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const JSON_WRAPPER_KEYS: &[&str] = &["records", "rows", "data"];

/// Input formats understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Guess the format from a file extension; anything but `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Read a file, picking the parser from its extension.
pub fn read_table(path: &Path, options: &IngestOptions) -> Result<SourceTable> {
    let bytes = read_bytes(path, options.max_file_size)?;
    match InputFormat::from_path(path) {
        InputFormat::Csv => parse_csv(&bytes, path, options),
        InputFormat::Json => parse_json(&bytes, path),
    }
}

/// Check size limits and read the whole file.
fn read_bytes(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    std::fs::read(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, error: std::io::Error) -> IngestError {
    if error.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

/// Decode raw bytes to text.
///
/// A UTF-8 byte-order mark is stripped; bytes that are not valid UTF-8 are
/// decoded as GB18030.
pub fn decode_text<'a>(bytes: &'a [u8], path: &Path) -> Result<Cow<'a, str>> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: "UTF-16 LE",
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: "UTF-16 BE",
        });
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }
    let (text, _, had_errors) = GB18030.decode(bytes);
    if had_errors {
        tracing::warn!(path = %path.display(), "input contains bytes invalid in GB18030");
    } else {
        tracing::debug!(path = %path.display(), "decoded input as GB18030");
    }
    Ok(text)
}

/// Parse CSV bytes.
///
/// The last of `options.header_rows` rows holds the column names. Ragged
/// rows are padded or truncated to the header width.
pub fn parse_csv(bytes: &[u8], path: &Path, options: &IngestOptions) -> Result<SourceTable> {
    let text = decode_text(bytes, path)?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());

    let header_rows = options.header_rows.max(1);
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, &e))?;
        if index + 1 < header_rows {
            continue;
        }
        let Some(width) = headers.as_ref().map(Vec::len) else {
            let names: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();
            if names.iter().all(String::is_empty) {
                return Err(IngestError::NoHeaderDetected {
                    path: path.to_path_buf(),
                });
            }
            headers = Some(names);
            continue;
        };
        let mut values: Vec<SourceValue> = record
            .iter()
            .take(width)
            .map(|cell| SourceValue::Text(cell.to_string()))
            .collect();
        values.resize(width, SourceValue::Null);
        rows.push(SourceRow {
            row_number: rows.len() + 1,
            values,
        });
    }

    let headers = headers.ok_or_else(|| IngestError::NoHeaderDetected {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "parsed CSV input"
    );
    Ok(SourceTable { headers, rows })
}

fn csv_error(path: &Path, error: &csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Parse JSON bytes.
///
/// Headers are the union of row keys in first-seen order.
pub fn parse_json(bytes: &[u8], path: &Path) -> Result<SourceTable> {
    let text = decode_text(bytes, path)?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyInput {
            path: path.to_path_buf(),
        });
    }
    let document: Value = serde_json::from_str(&text).map_err(|source| IngestError::JsonParse {
        path: path.to_path_buf(),
        source,
    })?;
    let items = row_array(document, path)?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(IngestError::UnexpectedShape {
                path: path.to_path_buf(),
                reason: format!("row {} is not an object", index + 1),
            });
        };
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(object);
    }

    let rows = objects
        .into_iter()
        .enumerate()
        .map(|(index, mut object)| SourceRow {
            row_number: index + 1,
            values: headers
                .iter()
                .map(|header| json_cell(object.remove(header).unwrap_or(Value::Null)))
                .collect(),
        })
        .collect();
    Ok(SourceTable { headers, rows })
}

fn row_array(document: Value, path: &Path) -> Result<Vec<Value>> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => JSON_WRAPPER_KEYS
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| unexpected_shape(path, "object has no record array")),
        _ => Err(unexpected_shape(path, "expected an array of row objects")),
    }
}

fn unexpected_shape(path: &Path, reason: &str) -> IngestError {
    IngestError::UnexpectedShape {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}

fn json_cell(value: Value) -> SourceValue {
    match value {
        Value::Null => SourceValue::Null,
        Value::String(text) => SourceValue::Text(text),
        // Integers stay textual so long identity numbers keep every digit.
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .map_or(SourceValue::Null, SourceValue::Number),
        Value::Number(number) => SourceValue::Text(number.to_string()),
        Value::Bool(flag) => SourceValue::Text(flag.to_string()),
        other => SourceValue::Text(other.to_string()),
    }
}

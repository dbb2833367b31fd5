//! Instrument universe loading.
//!
//! Codes come either from a comma-separated list or from one column of a
//! CSV file (the recommended-funds export uses `代码`). Codes are
//! zero-padded, de-duplicated in first-seen order and optionally truncated.

use fundwatch_core::error::FundwatchError;
use fundwatch_core::types::InstrumentId;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Default code column of the recommended-funds CSV.
pub const DEFAULT_CODE_COLUMN: &str = "代码";

/// Normalize raw codes. Invalid entries are logged and skipped.
pub fn normalize_codes<I, S>(raw: I, max: Option<usize>) -> Vec<InstrumentId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for code in raw {
        if max.is_some_and(|m| ids.len() >= m) {
            break;
        }
        let code = code.as_ref();
        if code.trim().is_empty() {
            continue;
        }
        match InstrumentId::parse(code) {
            Ok(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            Err(e) => warn!(code, error = %e, "Skipping invalid instrument code"),
        }
    }
    ids
}

/// Parse a `1,2,3` style list.
pub fn parse_code_list(list: &str, max: Option<usize>) -> Vec<InstrumentId> {
    normalize_codes(list.split(','), max)
}

/// Load codes from `column` of a CSV file.
pub fn load_codes_from_csv(
    path: &Path,
    column: &str,
    max: Option<usize>,
) -> Result<Vec<InstrumentId>, FundwatchError> {
    let file = std::fs::File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| FundwatchError::Validation(format!("{}: {e}", path.display())))?;
    let index = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| {
            FundwatchError::Validation(format!(
                "{}: no column named {column:?}",
                path.display()
            ))
        })?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| FundwatchError::Validation(format!("{}: {e}", path.display())))?;
        if let Some(code) = record.get(index) {
            codes.push(code.to_string());
        }
    }

    let ids = normalize_codes(&codes, max);
    info!(path = %path.display(), rows = codes.len(), instruments = ids.len(), "Loaded universe");
    Ok(ids)
}

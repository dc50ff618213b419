//! Tabular reader and row dispatch (C2).
//!
//! Reads a CSV stream tolerant of a byte-order-mark prefix and
//! leading/trailing whitespace in headers and cells, requires the first
//! non-comment column to be `row_id`, and emits a list of [`bam_model::Row`]
//! plus a list of [`bam_model::ValidationError`]. Lines beginning with `#`
//! (as written by `bam-importer export`) are skipped as comments.

use std::collections::BTreeMap;
use std::io::Read;

use bam_model::{ObjectType, Row, RowAction, RowEnvelope, RowFields, ValidationError};
use thiserror::Error;
use tracing::warn;

const SUPPORTED_CSV_VERSIONS: &[&str] = &["3", "3.0"];
const BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error reading CSV input: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("expected first column to be `row_id`, found `{0}`")]
    MissingRowIdColumn(String),

    #[error("{count} row(s) failed validation in strict mode")]
    StrictModeFailed { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// A non-empty validation error list fails the whole parse.
    Strict,
    /// Validation errors are surfaced as warnings; valid rows proceed.
    Lenient,
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub rows: Vec<Row>,
    pub errors: Vec<ValidationError>,
    /// Populated once, the first time a `version` column value is seen
    /// that is absent from [`SUPPORTED_CSV_VERSIONS`].
    pub version_warning: Option<String>,
}

/// Parses a complete CSV document already read into memory. `sanitize_csv`
/// in `bam-util` is the recommended pre-pass for whitespace, but this
/// function tolerates un-sanitized whitespace and a BOM prefix on its own.
pub fn parse_csv(input: &str, mode: ParseMode) -> Result<ParseOutcome, ParseError> {
    let stripped = input.strip_prefix(BOM).unwrap_or(input);
    let without_comments: String = stripped
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(without_comments.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let row_id_index = headers
        .first()
        .filter(|h| h.eq_ignore_ascii_case("row_id"))
        .map(|_| 0usize)
        .ok_or_else(|| ParseError::MissingRowIdColumn(headers.first().cloned().unwrap_or_default()))?;

    let mut outcome = ParseOutcome::default();

    for record in reader.records() {
        let record = record?;
        let mut cells: BTreeMap<String, String> = BTreeMap::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(index) {
                cells.insert(header.clone(), value.trim().to_string());
            }
        }

        let row_id = record
            .get(row_id_index)
            .unwrap_or_default()
            .trim()
            .to_string();

        if outcome.version_warning.is_none() {
            if let Some(version) = cells.get("version").filter(|v| !v.is_empty()) {
                if !SUPPORTED_CSV_VERSIONS.contains(&version.as_str()) {
                    let message = format!("unrecognized schema version `{version}`");
                    warn!(row_id = %row_id, version = %version, "unsupported CSV schema version");
                    outcome.version_warning = Some(message);
                }
            }
        }

        let action_raw = cells.remove("action").unwrap_or_default();
        let object_type_raw = cells.remove("object_type").unwrap_or_default();
        let config = cells.remove("config").filter(|v| !v.is_empty());
        let view = cells.remove("view").filter(|v| !v.is_empty());
        cells.remove("version");

        let action = match action_raw.parse::<RowAction>() {
            Ok(action) => action,
            Err(err) => {
                outcome.errors.push(ValidationError::new(row_id.as_str(), "action", err.to_string()));
                continue;
            }
        };

        let object_type = match object_type_raw.parse::<ObjectType>() {
            Ok(object_type) => object_type,
            Err(err) => {
                outcome
                    .errors
                    .push(ValidationError::new(row_id.as_str(), "object_type", err.to_string()));
                continue;
            }
        };

        let mut envelope = RowEnvelope::new(row_id.clone(), action);
        if let Some(config) = config {
            envelope = envelope.with_config(config);
        }
        if let Some(view) = view {
            envelope = envelope.with_view(view);
        }

        let fields = RowFields::new(cells);
        let (row, row_errors) = Row::parse(envelope, object_type, &fields);
        outcome.errors.extend(row_errors);
        outcome.rows.push(row);
    }

    if mode == ParseMode::Strict && !outcome.errors.is_empty() {
        return Err(ParseError::StrictModeFailed {
            count: outcome.errors.len(),
        });
    }

    Ok(outcome)
}

/// Reads the full contents of `input` and delegates to [`parse_csv`].
pub fn parse_csv_reader<R: Read>(mut input: R, mode: ParseMode) -> Result<ParseOutcome, ParseError> {
    let mut buffer = String::new();
    input.read_to_string(&mut buffer)?;
    parse_csv(&buffer, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_valid_row() {
        let csv = "row_id,action,object_type,cidr\nr1,create,ip4_block,10.0.0.0/8\n";
        let outcome = parse_csv(csv, ParseMode::Strict).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].object_type(), ObjectType::Ip4Block);
    }

    #[test]
    fn tolerates_bom_and_whitespace() {
        let csv = format!("{BOM}row_id, action , object_type,cidr\n r1 , create , ip4_block , 10.0.0.0/8 \n");
        let outcome = parse_csv(&csv, ParseMode::Strict).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].row_id(), "r1");
    }

    #[test]
    fn skips_comment_lines() {
        let csv = "# exported 2026-01-01 from Default\nrow_id,action,object_type,cidr\nr1,create,ip4_block,10.0.0.0/8\n";
        let outcome = parse_csv(csv, ParseMode::Strict).unwrap();
        assert_eq!(outcome.rows.len(), 1);
    }

    #[test]
    fn missing_row_id_column_is_rejected() {
        let csv = "action,object_type,cidr\ncreate,ip4_block,10.0.0.0/8\n";
        assert!(matches!(
            parse_csv(csv, ParseMode::Lenient),
            Err(ParseError::MissingRowIdColumn(_))
        ));
    }

    #[test]
    fn strict_mode_fails_on_validation_errors() {
        let csv = "row_id,action,object_type,cidr\nr1,create,ip4_block,\n";
        assert!(matches!(
            parse_csv(csv, ParseMode::Strict),
            Err(ParseError::StrictModeFailed { count: 1 })
        ));
    }

    #[test]
    fn lenient_mode_surfaces_errors_but_keeps_going() {
        let csv = "row_id,action,object_type,cidr\nr1,create,ip4_block,\nr2,create,ip4_block,10.0.0.0/8\n";
        let outcome = parse_csv(csv, ParseMode::Lenient).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.rows.len(), 2);
    }

    #[test]
    fn unrecognized_schema_version_is_a_single_warning() {
        let csv = "row_id,action,object_type,cidr,version\nr1,create,ip4_block,10.0.0.0/8,9.9\nr2,create,ip4_block,10.0.1.0/24,9.9\n";
        let outcome = parse_csv(csv, ParseMode::Lenient).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.version_warning.as_deref(), Some("unrecognized schema version `9.9`"));
    }

    #[test]
    fn unknown_object_type_is_collected_not_fatal_in_lenient_mode() {
        let csv = "row_id,action,object_type\nr1,create,not_a_type\n";
        let outcome = parse_csv(csv, ParseMode::Lenient).unwrap();
        assert_eq!(outcome.rows.len(), 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field, "object_type");
    }
}

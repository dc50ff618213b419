//! Per-object-type payload schemas (C1): required/optional field
//! declarations, whitespace/case normalization, and syntactic validation.
//! Validation errors are collected rather than raised so the parser can
//! report many at once.

mod deployment;
mod device;
mod dns;
mod ip;
mod misc;

pub use deployment::*;
pub use device::*;
pub use dns::*;
pub use ip::*;
pub use misc::*;

use std::collections::BTreeMap;

use bam_util::normalize::parse_list;

use crate::ValidationError;

/// The non-envelope columns of a parsed CSV row, keyed by (already
/// trimmed) header name. Payload schemas pull their fields out of this via
/// [`RowFields::required`]/[`RowFields::optional`]/[`RowFields::list`],
/// accumulating a [`ValidationError`] per problem rather than failing on
/// the first one.
#[derive(Debug, Clone, Default)]
pub struct RowFields(pub BTreeMap<String, String>);

impl RowFields {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn optional(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn required<'a>(
        &'a self,
        row_id: &str,
        name: &str,
        errors: &mut Vec<ValidationError>,
    ) -> &'a str {
        match self.optional(name) {
            Some(value) => value,
            None => {
                errors.push(ValidationError::missing(row_id, name));
                ""
            }
        }
    }

    /// A `|`-delimited multi-valued field; callers expose this via a
    /// `get_<name>_list()` accessor on the payload struct.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.optional(name).map(parse_list).unwrap_or_default()
    }
}

/// Implemented by every typed row payload; `parse` normalizes and
/// validates the raw fields, returning both the (possibly partially
/// defaulted) payload and the errors found, so the caller decides whether
/// a non-empty error list is fatal to the row (strict mode) or merely a
/// warning.
pub trait RowPayload: Sized {
    fn parse(row_id: &str, fields: &RowFields) -> (Self, Vec<ValidationError>);
}

//! Collected, per-field validation errors (C1/C2). Unlike [`bam_errors::BamError`],
//! these never abort parsing — the parser gathers every one across every
//! row before deciding, in strict mode, whether to fail the run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_id: String,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(row_id: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(row_id: &str, field: &str) -> Self {
        Self::new(row_id, field, format!("required field `{field}` is missing"))
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: field `{}`: {}", self.row_id, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

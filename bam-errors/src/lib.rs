//! Shared error vocabulary for the reconciliation pipeline.
//!
//! Every crate in the workspace returns [`BamError`] (or a type that embeds
//! one) so that the executor can classify failures without each handler,
//! resolver, or client method inventing its own error shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stable tag for the kind of failure, independent of the human-readable
/// message. Used to build the per-row result and the aggregate summary
/// described in the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    PathNotFound,
    Conflict,
    NotFound,
    RateLimited,
    TransientNetwork,
    AuthExpired,
    PermissionDenied,
    UpstreamFailure,
    Fatal,
}

impl ErrorKind {
    /// Whether an error of this kind is safe to retry without additional
    /// failure-policy intervention (see the remote client facade's retry
    /// policy).
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::TransientNetwork | ErrorKind::RateLimited)
    }
}

/// The error type returned throughout the pipeline.
///
/// Variants mirror the error kinds in the error handling design 1:1; the
/// `row_id` field is populated wherever the failure can be attributed to a
/// single input row.
#[derive(Debug, Error)]
pub enum BamError {
    #[error("row {row_id}: validation failed on field `{field}`: {message}")]
    Validation {
        row_id: String,
        field: String,
        message: String,
    },

    #[error("row {row_id}: could not resolve path `{path}` to a {type_hint}")]
    PathNotFound {
        row_id: String,
        path: String,
        type_hint: String,
    },

    #[error("row {row_id}: resource already exists (409) at {endpoint}")]
    Conflict { row_id: String, endpoint: String },

    #[error("{context}: resource not found (404)")]
    NotFound { context: String },

    #[error("rate limited (429) after {attempts} attempts, last retry-after {retry_after:?}")]
    RateLimited {
        attempts: u32,
        retry_after: Duration,
    },

    #[error("transient network error after {attempts} attempts: {message}")]
    TransientNetwork { attempts: u32, message: String },

    #[error("authentication expired and retry also failed: {message}")]
    AuthExpired { message: String },

    #[error("row {row_id}: delete of protected kind `{kind}` refused without allow_dangerous_operations")]
    PermissionDenied { row_id: String, kind: String },

    #[error("row {row_id}: skipped because predecessor row {predecessor_row_id} failed")]
    UpstreamFailure {
        row_id: String,
        predecessor_row_id: String,
    },

    #[error("row {row_id}: {message}")]
    Fatal { row_id: String, message: String },
}

impl BamError {
    /// The stable [`ErrorKind`] this error reports as, used to build
    /// aggregate summaries and to drive the failure policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BamError::Validation { .. } => ErrorKind::Validation,
            BamError::PathNotFound { .. } => ErrorKind::PathNotFound,
            BamError::Conflict { .. } => ErrorKind::Conflict,
            BamError::NotFound { .. } => ErrorKind::NotFound,
            BamError::RateLimited { .. } => ErrorKind::RateLimited,
            BamError::TransientNetwork { .. } => ErrorKind::TransientNetwork,
            BamError::AuthExpired { .. } => ErrorKind::AuthExpired,
            BamError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            BamError::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
            BamError::Fatal { .. } => ErrorKind::Fatal,
        }
    }

    /// The `row_id` this error is attributed to, if any. `NotFound` and
    /// rate-limit/network errors surface at the client layer before a row
    /// is known and so carry none.
    pub fn row_id(&self) -> Option<&str> {
        match self {
            BamError::Validation { row_id, .. }
            | BamError::PathNotFound { row_id, .. }
            | BamError::Conflict { row_id, .. }
            | BamError::PermissionDenied { row_id, .. }
            | BamError::UpstreamFailure { row_id, .. }
            | BamError::Fatal { row_id, .. } => Some(row_id),
            BamError::NotFound { .. }
            | BamError::RateLimited { .. }
            | BamError::TransientNetwork { .. }
            | BamError::AuthExpired { .. } => None,
        }
    }

    pub fn upstream_failure(row_id: impl Into<String>, predecessor_row_id: impl Into<String>) -> Self {
        BamError::UpstreamFailure {
            row_id: row_id.into(),
            predecessor_row_id: predecessor_row_id.into(),
        }
    }
}

pub type BamResult<T> = std::result::Result<T, BamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_serde() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::PathNotFound,
            ErrorKind::Conflict,
            ErrorKind::NotFound,
            ErrorKind::RateLimited,
            ErrorKind::TransientNetwork,
            ErrorKind::AuthExpired,
            ErrorKind::PermissionDenied,
            ErrorKind::UpstreamFailure,
            ErrorKind::Fatal,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ErrorKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }

    #[test]
    fn transient_classification() {
        assert!(ErrorKind::TransientNetwork.is_transient());
        assert!(ErrorKind::RateLimited.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
    }

    #[test]
    fn upstream_failure_carries_both_ids() {
        let err = BamError::upstream_failure("row-7", "row-3");
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert_eq!(err.row_id(), Some("row-7"));
    }
}

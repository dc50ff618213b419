//! Append-only per-operation outcome record (C8), the substrate the
//! rollback generator reads back to emit inverse operations.

use serde::{Deserialize, Serialize};

use crate::object_type::ObjectType;
use crate::operation::OperationType;
use bam_errors::ErrorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub row_id: String,
    pub operation_type: OperationType,
    pub object_type: ObjectType,
    pub success: bool,
    pub resource_id: Option<i64>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub retried: bool,
}

impl ExecutionResult {
    pub fn success(
        row_id: impl Into<String>,
        operation_type: OperationType,
        object_type: ObjectType,
        resource_id: Option<i64>,
        duration_ms: u64,
        retried: bool,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            operation_type,
            object_type,
            success: true,
            resource_id,
            error_kind: None,
            error_message: None,
            duration_ms,
            retried,
        }
    }

    pub fn failure(
        row_id: impl Into<String>,
        operation_type: OperationType,
        object_type: ObjectType,
        error_kind: ErrorKind,
        error_message: impl Into<String>,
        duration_ms: u64,
        retried: bool,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            operation_type,
            object_type,
            success: false,
            resource_id: None,
            error_kind: Some(error_kind),
            error_message: Some(error_message.into()),
            duration_ms,
            retried,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_no_resource_id() {
        let result = ExecutionResult::failure(
            "r1",
            OperationType::Create,
            ObjectType::Ip4Block,
            ErrorKind::Conflict,
            "already exists",
            12,
            false,
        );
        assert!(!result.success);
        assert!(result.resource_id.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::Conflict));
    }

    #[test]
    fn success_carries_resource_id_and_no_error() {
        let result = ExecutionResult::success(
            "r1",
            OperationType::Create,
            ObjectType::Ip4Block,
            Some(99),
            8,
            true,
        );
        assert!(result.success);
        assert_eq!(result.resource_id, Some(99));
        assert!(result.error_kind.is_none());
    }
}

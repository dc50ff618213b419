//! Deletion of a protected kind (configuration, view, block, network,
//! zone) is refused unless `allow_dangerous_operations` is set; the
//! refusal is a distinct `permission-denied` error kind, not an API error.

use bam_errors::{BamError, BamResult};
use bam_model::ObjectType;

pub fn guard_dangerous_delete(
    row_id: &str,
    object_type: ObjectType,
    allow_dangerous_operations: bool,
) -> BamResult<()> {
    if object_type.is_protected() && !allow_dangerous_operations {
        return Err(BamError::PermissionDenied {
            row_id: row_id.to_string(),
            kind: object_type.as_csv_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_protected_delete_without_flag() {
        let err = guard_dangerous_delete("r1", ObjectType::Ip4Block, false).unwrap_err();
        assert_eq!(err.kind(), bam_errors::ErrorKind::PermissionDenied);
    }

    #[test]
    fn allows_protected_delete_with_flag() {
        assert!(guard_dangerous_delete("r1", ObjectType::Ip4Block, true).is_ok());
    }

    #[test]
    fn unprotected_kinds_never_need_the_flag() {
        assert!(guard_dangerous_delete("r1", ObjectType::HostRecord, false).is_ok());
    }
}

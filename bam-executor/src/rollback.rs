//! Rollback generator (C11): from a session's changelog, emit the inverse
//! operation list — creates undone by deletes, updates undone by
//! restoring captured prior state, deletes undone by recreating from
//! captured prior state — in reverse chronological order so a later
//! operation is always undone before whatever it depended on.

use bam_model::{Operation, OperationType};

use crate::changelog::ChangelogEntry;

/// Protected-kind deletes in the emitted plan still go through the
/// dangerous-operations gate at execution time (`bam_client::safety`);
/// this generator does not bypass it.
pub fn generate(entries: &[ChangelogEntry]) -> Vec<Operation> {
    entries
        .iter()
        .rev()
        .filter(|entry| entry.result.success)
        .filter_map(|entry| inverse(entry))
        .collect()
}

fn inverse(entry: &ChangelogEntry) -> Option<Operation> {
    let row_id = entry.result.row_id.clone();
    match entry.result.operation_type {
        OperationType::Create => {
            let resource_id = entry.result.resource_id?;
            Some(Operation::delete(row_id, entry.object_type, resource_id))
        }
        OperationType::Update => {
            let resource_id = entry.result.resource_id?;
            let prior = entry.prior_state.clone()?;
            Some(Operation::update(row_id, entry.object_type, resource_id, prior))
        }
        OperationType::Delete => {
            let prior = entry.prior_state.clone()?;
            Some(Operation::create(row_id, entry.object_type, prior))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_model::{ExecutionResult, ObjectType};
    use serde_json::json;

    fn entry(row_id: &str, op: OperationType, resource_id: Option<i64>, prior: Option<serde_json::Value>) -> ChangelogEntry {
        ChangelogEntry {
            result: ExecutionResult::success(row_id, op, ObjectType::Ip4Block, resource_id, 1, false),
            object_type: ObjectType::Ip4Block,
            payload: json!({}),
            prior_state: prior,
        }
    }

    #[test]
    fn create_rolls_back_to_a_delete() {
        let entries = vec![entry("r1", OperationType::Create, Some(7), None)];
        let plan = generate(&entries);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].operation_type, OperationType::Delete);
        assert_eq!(plan[0].resource_id, Some(7));
    }

    #[test]
    fn delete_rolls_back_to_a_create_from_prior_state() {
        let prior = json!({"cidr": "10.0.0.0/8"});
        let entries = vec![entry("r1", OperationType::Delete, Some(7), Some(prior.clone()))];
        let plan = generate(&entries);
        assert_eq!(plan[0].operation_type, OperationType::Create);
        assert_eq!(plan[0].payload, prior);
    }

    #[test]
    fn order_is_reversed_and_failures_are_excluded() {
        let mut failed = entry("r2", OperationType::Create, Some(8), None);
        failed.result.success = false;
        let entries = vec![entry("r1", OperationType::Create, Some(7), None), failed, entry("r3", OperationType::Create, Some(9), None)];
        let plan = generate(&entries);
        let row_ids: Vec<&str> = plan.iter().map(|op| op.row_id.as_str()).collect();
        assert_eq!(row_ids, vec!["r3", "r1"]);
    }

    #[test]
    fn update_without_captured_prior_state_is_skipped() {
        let entries = vec![entry("r1", OperationType::Update, Some(7), None)];
        assert!(generate(&entries).is_empty());
    }
}

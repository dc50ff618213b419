//! Orphan detection (§4.11b): after a successful `apply`, diff the remote
//! children of each touched block/network against the identities seen in
//! the input, and report, delete, or ignore remote resources with no
//! corresponding input row, per [`OrphanAction`].
//!
//! Scoped to the containment chain the feature's own description names —
//! a network's addresses, a block's networks — rather than every
//! container relationship in the schema (deployment roles, device
//! addresses, and the rest are not swept).

use std::collections::{BTreeSet, HashMap};

use bam_model::{ObjectType, Operation, OperationType};
use bam_planner::type_map::type_mapping;
use bam_client::filter::{Filter, FilterValue};
use bam_client::pagination::PageLimits;
use serde_json::Value;

use crate::config::OrphanAction;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone)]
pub struct OrphanFinding {
    pub object_type: ObjectType,
    pub container_id: i64,
    pub resource_id: i64,
    pub identity: String,
}

struct ContainedKind {
    object_type: ObjectType,
    /// The snake_case key the planner inserts into a resolved payload
    /// (`{kind}_id`, per the reference-resolution convention).
    container_field: &'static str,
    /// The remote API's camelCase name for the same relationship.
    remote_container_field: &'static str,
}

const SWEPT: &[ContainedKind] = &[
    ContainedKind { object_type: ObjectType::Ip4Network, container_field: "block_id", remote_container_field: "blockId" },
    ContainedKind { object_type: ObjectType::Ip6Network, container_field: "block_id", remote_container_field: "blockId" },
    ContainedKind { object_type: ObjectType::Ip4Address, container_field: "network_id", remote_container_field: "networkId" },
    ContainedKind { object_type: ObjectType::Ip6Address, container_field: "network_id", remote_container_field: "networkId" },
];

/// More-specific kinds first, so a delete pass removes an orphan
/// network's orphan addresses before the network itself.
fn delete_rank(object_type: ObjectType) -> u8 {
    match object_type {
        ObjectType::Ip4Address | ObjectType::Ip6Address => 0,
        ObjectType::Ip4Network | ObjectType::Ip6Network => 1,
        _ => 2,
    }
}

/// Queries every swept kind whose container was touched by a non-delete
/// operation in this batch, returning every remote child with no
/// matching input identity. A no-op under [`OrphanAction::Ignore`].
pub async fn sweep(pipeline: &Pipeline, operations: &[Operation], action: OrphanAction) -> anyhow::Result<Vec<OrphanFinding>> {
    if action == OrphanAction::Ignore {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for kind in SWEPT {
        let mapping = type_mapping(kind.object_type);
        let Some(identity_field) = mapping.identity.first() else { continue };

        let mut containers: HashMap<i64, BTreeSet<String>> = HashMap::new();
        for op in operations.iter().filter(|op| op.object_type == kind.object_type && op.operation_type != OperationType::Delete) {
            let Some(container_id) = op.payload.get(kind.container_field).and_then(Value::as_i64) else { continue };
            let Some(identity) = op.payload.get(identity_field.payload_field).and_then(Value::as_str) else { continue };
            containers.entry(container_id).or_default().insert(identity.to_string());
        }

        for (container_id, seen) in containers {
            let filters = [Filter::eq(kind.remote_container_field, FilterValue::Number(container_id))];
            let entities = pipeline.client.list(mapping.collection, &filters, PageLimits::default()).await?;
            for entity in entities {
                let Some(identity) = entity.get(identity_field.remote_field).and_then(Value::as_str) else { continue };
                if seen.contains(identity) {
                    continue;
                }
                let Some(resource_id) = entity.get("id").and_then(Value::as_i64) else { continue };
                findings.push(OrphanFinding { object_type: kind.object_type, container_id, resource_id, identity: identity.to_string() });
            }
        }
    }
    Ok(findings)
}

/// Deletes every finding under [`OrphanAction::Delete`], most-specific
/// kind first. Each delete still goes through the client's safety gate
/// (`bam_client::safety`), so a protected kind is refused unless
/// `allow_dangerous_operations` is set. No-op for `Report`/`Ignore`.
pub async fn apply_action(pipeline: &Pipeline, mut findings: Vec<OrphanFinding>, action: OrphanAction) -> Vec<(OrphanFinding, anyhow::Result<()>)> {
    if action != OrphanAction::Delete {
        return findings.into_iter().map(|f| (f, Ok(()))).collect();
    }
    findings.sort_by_key(|f| delete_rank(f.object_type));

    let mut results = Vec::with_capacity(findings.len());
    for finding in findings {
        let row_id = format!("orphan-{}-{}", finding.object_type, finding.resource_id);
        let outcome = pipeline
            .registry
            .delete(&pipeline.client, &row_id, finding.object_type, finding.resource_id)
            .await
            .map_err(anyhow::Error::from);
        results.push((finding, outcome));
    }
    results
}

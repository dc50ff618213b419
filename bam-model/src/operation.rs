//! The planner's unit of work (C5/C6) and the deferred-reference sentinel
//! convention that lets the executor resolve back-references without a
//! cyclic dependency graph (see the design note on cycles via
//! back-references).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object_type::ObjectType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationType::Create => "create",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A payload entry of the form `_deferred_<kind> = <identity>`, e.g.
/// `_deferred_block_cidr = "10.0.0.0/8"`, pointing at a resource another
/// operation in the same batch will produce. The executor resolves these
/// against a `(row_id -> resource_id)` map once the producing row's
/// operation has `success = true`, then replaces the sentinel key with the
/// concrete `<kind>_id` field (invariant: resolved exactly once, only
/// after success).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredReference {
    pub kind: String,
    pub identity: String,
}

const DEFERRED_PREFIX: &str = "_deferred_";

impl DeferredReference {
    pub fn sentinel_key(&self) -> String {
        format!("{DEFERRED_PREFIX}{}", self.kind)
    }

    /// Parses a `(key, value)` payload entry into a deferred reference, if
    /// the key has the `_deferred_<kind>` shape and the value is a string
    /// identity.
    pub fn parse_entry(key: &str, value: &Value) -> Option<Self> {
        let kind = key.strip_prefix(DEFERRED_PREFIX)?;
        if kind.is_empty() {
            return None;
        }
        let identity = value.as_str()?;
        Some(Self {
            kind: kind.to_string(),
            identity: identity.to_string(),
        })
    }
}

/// The planner's unit of work. Operations are constructed once and then
/// mutated only on successful completion, when `resolve_deferred` replaces
/// sentinel keys in the payload with concrete ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub row_id: String,
    pub operation_type: OperationType,
    pub object_type: ObjectType,
    pub resource_id: Option<i64>,
    pub payload: Value,
    pub dependencies: BTreeSet<String>,
    /// `kind -> producing row_id` for every `_deferred_<kind>` sentinel in
    /// `payload`, so the executor can look up the right entry of its
    /// `(row_id -> resource_id)` map without re-deriving identity. Every
    /// key here also has a corresponding entry in `dependencies`, but not
    /// every dependency (e.g. a containment edge) has a deferred entry.
    pub deferred_sources: BTreeMap<String, String>,
}

impl Operation {
    pub fn create(row_id: impl Into<String>, object_type: ObjectType, payload: Value) -> Self {
        Self {
            row_id: row_id.into(),
            operation_type: OperationType::Create,
            object_type,
            resource_id: None,
            payload,
            dependencies: BTreeSet::new(),
            deferred_sources: BTreeMap::new(),
        }
    }

    pub fn update(
        row_id: impl Into<String>,
        object_type: ObjectType,
        resource_id: i64,
        payload: Value,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            operation_type: OperationType::Update,
            object_type,
            resource_id: Some(resource_id),
            payload,
            dependencies: BTreeSet::new(),
            deferred_sources: BTreeMap::new(),
        }
    }

    pub fn delete(row_id: impl Into<String>, object_type: ObjectType, resource_id: i64) -> Self {
        Self {
            row_id: row_id.into(),
            operation_type: OperationType::Delete,
            object_type,
            resource_id: Some(resource_id),
            payload: Value::Null,
            dependencies: BTreeSet::new(),
            deferred_sources: BTreeMap::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn with_deferred_sources(mut self, deferred_sources: BTreeMap<String, String>) -> Self {
        self.deferred_sources.extend(deferred_sources);
        self
    }

    /// Invariant check: `create` carries no `resource_id`; `update` and
    /// `delete` both require one.
    pub fn is_well_formed(&self) -> bool {
        match self.operation_type {
            OperationType::Create => self.resource_id.is_none(),
            OperationType::Update | OperationType::Delete => self.resource_id.is_some(),
        }
    }

    /// All deferred references named anywhere in the payload's top-level
    /// object keys.
    pub fn deferred_references(&self) -> Vec<DeferredReference> {
        let Value::Object(map) = &self.payload else {
            return Vec::new();
        };
        map.iter()
            .filter_map(|(key, value)| DeferredReference::parse_entry(key, value))
            .collect()
    }

    /// Replaces a resolved deferred reference's sentinel key with
    /// `<kind>_id = resource_id`. Only ever called after the producing
    /// operation has `success = true` (the payload-mutation invariant: a
    /// failed operation never mutates its own payload, so this method is
    /// the sole payload mutator, and only for success).
    pub fn resolve_deferred(&mut self, reference: &DeferredReference, resource_id: i64) {
        if let Value::Object(map) = &mut self.payload {
            if map.remove(&reference.sentinel_key()).is_some() {
                map.insert(format!("{}_id", reference.kind), Value::from(resource_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_has_no_resource_id_update_delete_do() {
        let create = Operation::create("r1", ObjectType::Ip4Block, json!({}));
        assert!(create.is_well_formed());

        let update = Operation::update("r2", ObjectType::Ip4Block, 7, json!({}));
        assert!(update.is_well_formed());

        let malformed = Operation {
            resource_id: Some(1),
            ..Operation::create("r3", ObjectType::Ip4Block, json!({}))
        };
        assert!(!malformed.is_well_formed());
    }

    #[test]
    fn deferred_reference_key_round_trips() {
        let reference = DeferredReference {
            kind: "block_cidr".to_string(),
            identity: "10.0.0.0/8".to_string(),
        };
        let key = reference.sentinel_key();
        assert_eq!(key, "_deferred_block_cidr");
        assert_eq!(
            DeferredReference::parse_entry(&key, &json!("10.0.0.0/8")),
            Some(reference)
        );
    }

    #[test]
    fn resolve_deferred_replaces_sentinel_with_id() {
        let mut op = Operation::create(
            "r1",
            ObjectType::DhcpDeploymentRole,
            json!({"_deferred_server_interface": "eth0.example.com"}),
        );
        let reference = DeferredReference {
            kind: "server_interface".to_string(),
            identity: "eth0.example.com".to_string(),
        };
        assert_eq!(op.deferred_references(), vec![reference.clone()]);
        op.resolve_deferred(&reference, 42);
        assert_eq!(op.payload, json!({"server_interface_id": 42}));
    }
}

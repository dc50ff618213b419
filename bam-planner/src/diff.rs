//! Diff / planner (C5): turns each parsed row into a typed [`Operation`],
//! resolving parent references through the path resolver and querying the
//! remote client for the row's own target identity.

use std::sync::Arc;

use bam_client::filter::{Filter, FilterValue};
use bam_client::pagination::PageLimits;
use bam_client::BamClient;
use bam_errors::{BamError, BamResult};
use bam_model::{ObjectType, Operation, RowAction, Row};
use bam_resolver::PathResolver;
use bam_util::CanonicalPath;
use serde_json::Value;
use tracing::debug;

use crate::containment;
use crate::type_map::{self, reference_fields, reference_kind, type_mapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    CreateOnly,
    Upsert,
    UpdateOnly,
}

/// One row's planning failure, carrying enough to report per-row like the
/// parser's `ValidationError` does.
#[derive(Debug)]
pub struct PlanError {
    pub row_id: String,
    pub source: BamError,
}

#[derive(Debug, Default)]
pub struct PlanOutcome {
    pub operations: Vec<Operation>,
    pub errors: Vec<PlanError>,
}

pub struct Planner {
    client: Arc<BamClient>,
    resolver: Arc<PathResolver>,
    update_mode: UpdateMode,
}

enum Reference {
    Resolved(i64),
    Deferred { producing_row_id: String },
    Missing,
}

impl Planner {
    pub fn new(client: Arc<BamClient>, resolver: Arc<PathResolver>, update_mode: UpdateMode) -> Self {
        Self { client, resolver, update_mode }
    }

    /// Deterministic given the same rows, resolver state, and remote
    /// state: rows are planned in input order and no operation depends on
    /// another's planning outcome except through the dependency set.
    pub async fn plan(&self, rows: &[Row]) -> PlanOutcome {
        let mut outcome = PlanOutcome::default();
        for row in rows {
            match self.plan_row(row, rows).await {
                Ok(Some(op)) => outcome.operations.push(op),
                Ok(None) => debug!(row_id = row.row_id(), "idempotent no-op: delete of an already-absent target"),
                Err(source) => outcome.errors.push(PlanError { row_id: row.row_id().to_string(), source }),
            }
        }
        outcome
    }

    async fn plan_row(&self, row: &Row, all_rows: &[Row]) -> BamResult<Option<Operation>> {
        let object_type = row.object_type();
        let mapping = type_mapping(object_type);
        let mut payload = row.payload_json();
        let mut dependencies = std::collections::BTreeSet::new();
        let mut deferred_sources = std::collections::BTreeMap::new();

        self.resolve_envelope_parents(row, &mut payload, all_rows, &mut dependencies, &mut deferred_sources)
            .await?;
        self.resolve_type_references(row, object_type, &mut payload, all_rows, &mut dependencies, &mut deferred_sources)
            .await?;

        if let Some(containing) = containment::containing_row_id(row, all_rows) {
            dependencies.insert(containing);
        }

        let existing = self.find_existing(&mapping, &payload).await?;

        let operation = match (row.envelope.action, existing) {
            (RowAction::Create, None) => Some(Operation::create(row.row_id(), object_type, payload)),
            (RowAction::Create, Some(entity)) => match self.update_mode {
                UpdateMode::CreateOnly => {
                    return Err(BamError::Conflict {
                        row_id: row.row_id().to_string(),
                        endpoint: mapping.collection.to_string(),
                    })
                }
                UpdateMode::Upsert | UpdateMode::UpdateOnly => {
                    Some(Operation::update(row.row_id(), object_type, entity_id(&entity)?, payload))
                }
            },
            (RowAction::Update, Some(entity)) => {
                Some(Operation::update(row.row_id(), object_type, entity_id(&entity)?, payload))
            }
            (RowAction::Update, None) => {
                return Err(BamError::NotFound {
                    context: format!("row {}: no existing {object_type} to update", row.row_id()),
                })
            }
            (RowAction::Delete, Some(entity)) => {
                Some(Operation::delete(row.row_id(), object_type, entity_id(&entity)?))
            }
            (RowAction::Delete, None) => None,
        };

        Ok(operation.map(|op| op.with_dependencies(dependencies).with_deferred_sources(deferred_sources)))
    }

    async fn find_existing(&self, mapping: &type_map::TypeMapping, payload: &Value) -> BamResult<Option<Value>> {
        let filters: Vec<Filter> = mapping
            .identity
            .iter()
            .filter_map(|field| {
                let value = payload.get(field.payload_field)?;
                Some(Filter::eq(field.remote_field, filter_value(value)?))
            })
            .collect();
        if filters.len() != mapping.identity.len() {
            // An identity field is missing from the payload; treat as never-found
            // rather than querying on a partial identity.
            return Ok(None);
        }
        let results = self
            .client
            .list(mapping.collection, &filters, PageLimits { max_items: Some(1), max_pages: Some(1) })
            .await?;
        Ok(results.into_iter().next())
    }

    async fn resolve_envelope_parents(
        &self,
        row: &Row,
        payload: &mut Value,
        all_rows: &[Row],
        dependencies: &mut std::collections::BTreeSet<String>,
        deferred_sources: &mut std::collections::BTreeMap<String, String>,
    ) -> BamResult<()> {
        if let Some(config) = row.envelope.config.clone() {
            self.apply_reference(
                row,
                "configuration",
                &config,
                ObjectType::Configuration,
                payload,
                all_rows,
                dependencies,
                deferred_sources,
            )
            .await?;
        }
        if let Some(view) = row.envelope.view.clone() {
            self.apply_reference(row, "view", &view, ObjectType::View, payload, all_rows, dependencies, deferred_sources)
                .await?;
        }
        Ok(())
    }

    async fn resolve_type_references(
        &self,
        row: &Row,
        object_type: ObjectType,
        payload: &mut Value,
        all_rows: &[Row],
        dependencies: &mut std::collections::BTreeSet<String>,
        deferred_sources: &mut std::collections::BTreeMap<String, String>,
    ) -> BamResult<()> {
        for field in reference_fields(object_type) {
            let Some(raw) = payload.get(field.payload_field).and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            let kind = reference_kind(field.payload_field).to_string();
            if let Value::Object(map) = payload {
                map.remove(field.payload_field);
            }
            self.apply_reference(row, &kind, &raw, field.referenced_type, payload, all_rows, dependencies, deferred_sources)
                .await?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_reference(
        &self,
        row: &Row,
        kind: &str,
        raw_value: &str,
        referenced_type: ObjectType,
        payload: &mut Value,
        all_rows: &[Row],
        dependencies: &mut std::collections::BTreeSet<String>,
        deferred_sources: &mut std::collections::BTreeMap<String, String>,
    ) -> BamResult<()> {
        match self.resolve_reference(kind, raw_value, referenced_type, all_rows).await? {
            Reference::Resolved(id) => {
                if let Value::Object(map) = payload {
                    map.insert(format!("{kind}_id"), Value::from(id));
                }
            }
            Reference::Deferred { producing_row_id } => {
                if let Value::Object(map) = payload {
                    map.insert(format!("_deferred_{kind}"), Value::String(raw_value.to_string()));
                }
                dependencies.insert(producing_row_id.clone());
                deferred_sources.insert(kind.to_string(), producing_row_id);
            }
            Reference::Missing => {
                return Err(BamError::PathNotFound {
                    row_id: row.row_id().to_string(),
                    path: raw_value.to_string(),
                    type_hint: referenced_type.as_csv_str().to_string(),
                })
            }
        }
        Ok(())
    }

    async fn resolve_reference(
        &self,
        kind: &str,
        raw_value: &str,
        referenced_type: ObjectType,
        all_rows: &[Row],
    ) -> BamResult<Reference> {
        let resolved = if referenced_type == ObjectType::View {
            self.resolver.resolve_view(raw_value).await?
        } else {
            let path = CanonicalPath::new(raw_value);
            self.resolver.resolve(referenced_type.as_bam_type(), &path).await?
        };

        if let Some(id) = resolved {
            return Ok(Reference::Resolved(id));
        }

        let producing_row_id = all_rows.iter().find(|candidate| {
            candidate.object_type() == referenced_type
                && candidate.envelope.action == RowAction::Create
                && row_identity_matches(candidate, raw_value)
        });

        match producing_row_id {
            Some(candidate) => Ok(Reference::Deferred { producing_row_id: candidate.row_id().to_string() }),
            None => {
                debug!(kind, raw_value, "reference does not resolve and is not produced in this batch");
                Ok(Reference::Missing)
            }
        }
    }
}

fn filter_value(value: &Value) -> Option<FilterValue> {
    match value {
        Value::String(s) => Some(FilterValue::Str(s.clone())),
        Value::Number(n) => n.as_i64().map(FilterValue::Number),
        Value::Bool(b) => Some(FilterValue::Bool(*b)),
        _ => None,
    }
}

fn entity_id(entity: &Value) -> BamResult<i64> {
    entity.get("id").and_then(Value::as_i64).ok_or_else(|| BamError::Fatal {
        row_id: String::new(),
        message: "remote entity is missing its `id` field".to_string(),
    })
}

fn row_identity_matches(row: &Row, raw_value: &str) -> bool {
    let mapping = type_mapping(row.object_type());
    let Some(first) = mapping.identity.first() else { return false };
    row.payload_json().get(first.payload_field).and_then(Value::as_str) == Some(raw_value)
}

//! Adapts [`BamClient`] to the resolver's [`RemoteLookup`] trait: a
//! `type_hint` (the remote API's PascalCase discriminator) plus a
//! canonical path resolve to a collection and identity filter the same way
//! the planner's own `find_existing` does.

use std::sync::Arc;

use async_trait::async_trait;
use bam_client::filter::{Filter, FilterValue};
use bam_client::pagination::PageLimits;
use bam_client::BamClient;
use bam_errors::{BamError, BamResult};
use bam_model::ObjectType;
use bam_planner::type_map::type_mapping;
use bam_resolver::RemoteLookup;
use bam_util::CanonicalPath;
use serde_json::Value;

pub struct ClientLookup {
    client: Arc<BamClient>,
}

impl ClientLookup {
    pub fn new(client: Arc<BamClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteLookup for ClientLookup {
    async fn lookup(&self, type_hint: &str, path: &CanonicalPath) -> BamResult<Option<i64>> {
        let object_type = ObjectType::ALL.iter().copied().find(|ty| ty.as_bam_type() == type_hint).ok_or_else(|| BamError::Fatal {
            row_id: String::new(),
            message: format!("resolver: `{type_hint}` is not a recognized remote type discriminator"),
        })?;
        let mapping = type_mapping(object_type);
        let Some(identity) = mapping.identity.first() else {
            return Ok(None);
        };
        let filters = vec![Filter::eq(identity.remote_field, FilterValue::Str(path.as_str().to_string()))];
        let results = self.client.list(mapping.collection, &filters, PageLimits { max_items: Some(1), max_pages: Some(1) }).await?;
        Ok(results.into_iter().next().and_then(|entity| entity.get("id").and_then(Value::as_i64)))
    }
}

//! `export` (§4.0d): dumps a configuration's resource tree back to the
//! input CSV schema, one row per remote entity, as a starting point for a
//! later `apply` against a different server.
//!
//! Flattens each entity's JSON fields directly into extra CSV columns
//! rather than reverse-mapping through the 37-way typed row payload
//! schema `bam-model` defines for parsing: the payload shapes round-trip
//! through JSON keys either way, and a flattening export avoids a second,
//! rarely-exercised typed-to-CSV mapping that would have to track the
//! parser's own mapping field for field.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use bam_client::filter::{Filter, FilterValue};
use bam_client::pagination::PageLimits;
use bam_model::ObjectType;
use bam_planner::type_map::type_mapping;
use serde_json::Value;

use crate::config::BamConfig;
use crate::exit::ExitCode;
use crate::pipeline::Pipeline;

/// The resource kinds exported by default when `--object-type` is not
/// given: the entities an address-management CSV typically seeds first.
const DEFAULT_EXPORT_TYPES: &[ObjectType] =
    &[ObjectType::Ip4Block, ObjectType::Ip4Network, ObjectType::Ip4Address, ObjectType::DnsZone, ObjectType::HostRecord];

const OMITTED_FIELDS: &[&str] = &["id", "_links", "configurationId", "viewId"];

pub async fn run(config: &BamConfig, configuration: &str, output: &Path, object_type: Option<&str>) -> anyhow::Result<ExitCode> {
    let pipeline = Pipeline::build(config)?;

    let configs = pipeline
        .client
        .list("configurations", &[Filter::eq("name", FilterValue::Str(configuration.to_string()))], PageLimits { max_items: Some(1), max_pages: Some(1) })
        .await?;
    let Some(config_entity) = configs.into_iter().next() else {
        eprintln!("export: no configuration named `{configuration}`");
        return Ok(ExitCode::Failure);
    };
    let Some(config_id) = config_entity.get("id").and_then(Value::as_i64) else {
        eprintln!("export: configuration `{configuration}` has no `id`");
        return Ok(ExitCode::Failure);
    };

    let types: Vec<ObjectType> = match object_type {
        Some(raw) => {
            let parsed = ObjectType::from_str(raw).map_err(|err| anyhow::anyhow!("export: {err}"))?;
            vec![parsed]
        }
        None => DEFAULT_EXPORT_TYPES.to_vec(),
    };

    let mut rows: Vec<(ObjectType, Value)> = Vec::new();
    for ty in &types {
        let mapping = type_mapping(*ty);
        let entities = pipeline
            .client
            .list(mapping.collection, &[Filter::eq("configurationId", FilterValue::Number(config_id))], PageLimits::default())
            .await?;
        for entity in entities {
            rows.push((*ty, entity));
        }
    }

    let mut columns: BTreeSet<String> = BTreeSet::new();
    for (_, entity) in &rows {
        if let Value::Object(map) = entity {
            for key in map.keys() {
                if !OMITTED_FIELDS.contains(&key.as_str()) {
                    columns.insert(key.clone());
                }
            }
        }
    }
    let columns: Vec<String> = columns.into_iter().collect();

    let mut file = std::fs::File::create(output)?;
    use std::io::Write;
    let timestamp = time::OffsetDateTime::now_utc();
    writeln!(file, "# exported {timestamp} from configuration `{configuration}`, {} row(s)", rows.len())?;

    let mut header = vec!["row_id".to_string(), "action".to_string(), "object_type".to_string(), "config".to_string()];
    header.extend(columns.iter().cloned());

    let mut writer = csv::WriterBuilder::new().from_writer(file);
    writer.write_record(&header)?;
    for (index, (ty, entity)) in rows.iter().enumerate() {
        let mut record = vec![format!("export-{index}"), "create".to_string(), ty.as_csv_str().to_string(), configuration.to_string()];
        for column in &columns {
            record.push(field_as_csv_value(entity, column));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!("export: wrote {} row(s) to {}", rows.len(), output.display());
    Ok(ExitCode::Success)
}

fn field_as_csv_value(entity: &Value, field: &str) -> String {
    match entity.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

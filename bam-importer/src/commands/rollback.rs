//! `rollback` (§6): replay a session's changelog as an inverse operation
//! plan, in the generator's reverse-chronological order (C11).
//!
//! Executed sequentially rather than through the concurrent dependency
//! graph [`bam_executor::Executor`] drives for `apply`: the rollback list's
//! list position already encodes the correct undo order, and the
//! generated operations carry no `dependencies` of their own.

use bam_executor::read_changelog;
use bam_model::OperationType;

use crate::config::BamConfig;
use crate::exit::ExitCode;
use crate::pipeline::Pipeline;

pub async fn run(config: &BamConfig, session_id: &str, batch_id: &str, dry_run: bool) -> anyhow::Result<ExitCode> {
    let changelog_path = super::changelog_path(config, session_id, batch_id)?;
    let entries = read_changelog(&changelog_path)?;
    let plan = bam_executor::generate_rollback(&entries);
    println!("rollback: {} inverse operation(s) generated from {} changelog entries", plan.len(), entries.len());

    if dry_run {
        for op in &plan {
            println!("{} {} {}", op.row_id, op.operation_type, op.object_type);
        }
        return Ok(ExitCode::Success);
    }

    let pipeline = Pipeline::build(config)?;
    let mut failures = 0usize;
    for op in &plan {
        let result = match op.operation_type {
            OperationType::Create => pipeline
                .registry
                .create(&pipeline.client, &op.row_id, op.object_type, &op.payload, config.policy.conflict_resolution)
                .await
                .map(|_| ()),
            OperationType::Update => pipeline
                .registry
                .update(&pipeline.client, &op.row_id, op.object_type, op.resource_id.unwrap_or_default(), &op.payload)
                .await
                .map(|_| ()),
            OperationType::Delete => {
                pipeline.registry.delete(&pipeline.client, &op.row_id, op.object_type, op.resource_id.unwrap_or_default()).await
            }
        };
        match result {
            Ok(()) => println!("{}: rolled back", op.row_id),
            Err(err) => {
                failures += 1;
                eprintln!("{}: rollback failed: {err}", op.row_id);
            }
        }
    }

    if failures > 0 {
        return Ok(ExitCode::Failure);
    }
    Ok(ExitCode::Success)
}

//! `apply` (§6): plan the input, then execute it through the dependency
//! graph behind the adaptive throttle, checkpointing and changelogging as
//! it goes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bam_executor::{Checkpointer, ChangelogWriter, Executor, ExecutorConfig};
use bam_model::OperationType;
use bam_parser::{parse_csv, ParseMode};

use crate::config::BamConfig;
use crate::exit::ExitCode;
use crate::pipeline::{ctrl_c_shutdown, Pipeline};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &BamConfig,
    input: &Path,
    dry_run: bool,
    resume: bool,
    yes: bool,
    session_id: &str,
    batch_id: &str,
) -> anyhow::Result<ExitCode> {
    let text = super::read_input(input)?;
    let outcome = match parse_csv(&text, ParseMode::Lenient) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("parse failed: {err}");
            return Ok(ExitCode::Failure);
        }
    };
    for error in &outcome.errors {
        eprintln!("{}: {} ({}), row skipped", error.row_id, error.message, error.field);
    }

    let pipeline = Pipeline::build(config)?;
    let plan = pipeline.planner.plan(&outcome.rows).await;
    for error in &plan.errors {
        eprintln!("{}: {}", error.row_id, error.source);
    }

    let dangerous_delete = plan
        .operations
        .iter()
        .any(|op| op.operation_type == OperationType::Delete && op.object_type.is_protected());
    if config.policy.safe_mode && dangerous_delete && !yes {
        eprintln!("apply: plan deletes a protected resource kind; pass --yes to confirm (safe_mode is on)");
        return Ok(ExitCode::Failure);
    }

    std::fs::create_dir_all(&config.checkpoint_dir)?;
    let checkpointer = Arc::new(Checkpointer::open(&config.checkpoint_dir)?);
    if resume {
        match checkpointer.load(session_id, batch_id)? {
            Some(checkpoint) => println!(
                "apply: resuming session {session_id}/{batch_id}, {}/{} operations previously accounted for (re-running full plan; completed operations are idempotent creates/patches)",
                checkpoint.completed_operations, checkpoint.total_operations
            ),
            None => println!("apply: --resume given but no prior checkpoint for {session_id}/{batch_id}, starting fresh"),
        }
    }

    let changelog_path = super::changelog_path(config, session_id, batch_id)?;
    let changelog = Arc::new(parking_lot::Mutex::new(ChangelogWriter::create(&changelog_path)?));

    let executor_config = ExecutorConfig {
        session_id: session_id.to_string(),
        batch_id: batch_id.to_string(),
        failure_policy: config.policy.failure_policy,
        conflict_resolution: config.policy.conflict_resolution,
        dry_run,
        checkpoint_every_operations: 25,
        checkpoint_every: Duration::from_secs(5),
    };
    let executor = Executor::new(
        pipeline.client.clone(),
        pipeline.registry.clone(),
        pipeline.throttle.clone(),
        Some(checkpointer),
        Some(changelog),
        executor_config,
    );

    let operations_for_orphan_sweep = plan.operations.clone();
    let (_shutdown_tx, shutdown_rx) = ctrl_c_shutdown();
    let executor_outcome = executor.run(plan.operations, shutdown_rx).await?;

    let failures = executor_outcome.results.iter().filter(|r| !r.success).count();
    println!(
        "apply: {} succeeded, {} failed, checkpoint status {:?}",
        executor_outcome.results.len() - failures,
        failures,
        executor_outcome.checkpoint.status
    );
    for result in executor_outcome.results.iter().filter(|r| !r.success) {
        eprintln!("{}: {}", result.row_id, result.error_message.as_deref().unwrap_or("unknown error"));
    }

    if failures == 0 && plan.errors.is_empty() && !dry_run && config.policy.enable_orphan_detection {
        let findings = crate::orphan::sweep(&pipeline, &operations_for_orphan_sweep, config.policy.orphan_action).await?;
        if findings.is_empty() {
            println!("apply: orphan sweep found nothing");
        } else {
            let outcomes = crate::orphan::apply_action(&pipeline, findings, config.policy.orphan_action).await;
            for (finding, outcome) in outcomes {
                match outcome {
                    Ok(()) => println!(
                        "orphan: {} `{}` (id {}) under container {} [{:?}]",
                        finding.object_type, finding.identity, finding.resource_id, finding.container_id, config.policy.orphan_action
                    ),
                    Err(err) => eprintln!("orphan: failed to delete {} `{}`: {err}", finding.object_type, finding.identity),
                }
            }
        }
    }

    if failures > 0 || !plan.errors.is_empty() {
        return Ok(ExitCode::Failure);
    }
    Ok(ExitCode::Success)
}

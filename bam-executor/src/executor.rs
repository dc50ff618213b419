//! The executor loop (C8): pulls the dependency graph's ready set, spawns
//! one task per operation behind the adaptive throttle, and applies the
//! configured failure policy as results come back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bam_client::BamClient;
use bam_errors::{BamError, BamResult, ErrorKind};
use bam_model::{Checkpoint, DeferredReference, ExecutionResult, Operation, OperationType};
use bam_planner::DependencyGraph;
use bam_throttle::AdaptiveThrottle;
use bam_util::shutdown::{shutdown_channel, ShutdownReceiver};
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::changelog::{ChangelogEntry, ChangelogWriter};
use crate::checkpoint::Checkpointer;
use crate::registry::{require_id, ConflictResolution, HandlerRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    FailFast,
    FailGroup,
    Continue,
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub session_id: String,
    pub batch_id: String,
    pub failure_policy: FailurePolicy,
    pub conflict_resolution: ConflictResolution,
    pub dry_run: bool,
    pub checkpoint_every_operations: usize,
    pub checkpoint_every: Duration,
}

pub struct ExecutorOutcome {
    pub results: Vec<ExecutionResult>,
    pub checkpoint: Checkpoint,
}

pub struct Executor {
    client: Arc<BamClient>,
    registry: Arc<HandlerRegistry>,
    throttle: Arc<AdaptiveThrottle>,
    checkpointer: Option<Arc<Checkpointer>>,
    changelog: Option<Arc<parking_lot::Mutex<ChangelogWriter>>>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(
        client: Arc<BamClient>,
        registry: Arc<HandlerRegistry>,
        throttle: Arc<AdaptiveThrottle>,
        checkpointer: Option<Arc<Checkpointer>>,
        changelog: Option<Arc<parking_lot::Mutex<ChangelogWriter>>>,
        config: ExecutorConfig,
    ) -> Self {
        Self { client, registry, throttle, checkpointer, changelog, config }
    }

    /// Runs every operation to completion or cancellation, returning every
    /// per-row [`ExecutionResult`] along with the final checkpoint state.
    pub async fn run(&self, operations: Vec<Operation>, external_shutdown: ShutdownReceiver) -> BamResult<ExecutorOutcome> {
        let total = operations.len();
        let graph = Arc::new(DependencyGraph::build(&operations)?);
        let by_row: HashMap<String, Operation> = operations.into_iter().map(|op| (op.row_id.clone(), op)).collect();
        let resolved: Arc<DashMap<String, i64>> = Arc::new(DashMap::new());
        let mut skipped: HashMap<String, String> = HashMap::new();

        let (cancel_tx, cancel_rx) = shutdown_channel();
        {
            let cancel_tx = cancel_tx.clone();
            let mut external = external_shutdown;
            tokio::spawn(async move {
                external.cancelled().await;
                cancel_tx.cancel();
            });
        }

        let mut checkpoint = Checkpoint::start(&self.config.session_id, &self.config.batch_id, total, now());
        let mut results = Vec::with_capacity(total);
        let mut frontier: Vec<String> = graph.ready();
        let mut join_set: JoinSet<(String, ExecutionResult, Option<Value>)> = JoinSet::new();
        let mut completed_since_checkpoint = 0usize;
        let mut last_checkpoint = Instant::now();

        loop {
            while let Some(row_id) = frontier.pop() {
                if let Some(predecessor) = skipped.get(&row_id).cloned() {
                    let op = &by_row[&row_id];
                    let result = ExecutionResult::failure(
                        row_id.clone(),
                        op.operation_type,
                        op.object_type,
                        ErrorKind::UpstreamFailure,
                        format!("skipped: predecessor row {predecessor} failed"),
                        0,
                        false,
                    );
                    results.push(result);
                    for successor in graph.complete(&row_id) {
                        skipped.entry(successor.clone()).or_insert_with(|| predecessor.clone());
                        frontier.push(successor);
                    }
                    continue;
                }

                if cancel_rx.is_cancelled() {
                    debug!(row_id, "not spawning: cancellation requested");
                    continue;
                }

                let op = by_row[&row_id].clone();
                join_set.spawn(execute_one(
                    op,
                    self.client.clone(),
                    self.registry.clone(),
                    self.throttle.clone(),
                    resolved.clone(),
                    self.config.dry_run,
                    self.config.conflict_resolution,
                    cancel_rx.clone(),
                ));
            }

            let Some(joined) = join_set.join_next().await else { break };
            let (row_id, result, prior_state) =
                joined.map_err(|err| BamError::Fatal { row_id: String::new(), message: format!("executor task panicked: {err}") })?;

            if let Some(writer) = &self.changelog {
                let op = &by_row[&row_id];
                let entry = ChangelogEntry { result: result.clone(), object_type: op.object_type, payload: op.payload.clone(), prior_state };
                writer.lock().append(&entry)?;
            }

            if result.success {
                if let Some(resource_id) = result.resource_id {
                    resolved.insert(row_id.clone(), resource_id);
                }
                frontier.extend(graph.complete(&row_id));
            } else {
                match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        warn!(row_id, "fail_fast: cancelling outstanding work");
                        cancel_tx.cancel();
                    }
                    FailurePolicy::FailGroup => {
                        for downstream in graph.downstream_of(&row_id) {
                            skipped.entry(downstream).or_insert_with(|| row_id.clone());
                        }
                        frontier.extend(graph.complete(&row_id));
                    }
                    FailurePolicy::Continue => {
                        frontier.extend(graph.complete(&row_id));
                    }
                }
            }

            results.push(result);
            completed_since_checkpoint += 1;
            checkpoint.advance(now());
            if let Some(checkpointer) = &self.checkpointer {
                if completed_since_checkpoint >= self.config.checkpoint_every_operations
                    || last_checkpoint.elapsed() >= self.config.checkpoint_every
                {
                    checkpointer.persist(&checkpoint)?;
                    completed_since_checkpoint = 0;
                    last_checkpoint = Instant::now();
                }
            }

            if frontier.is_empty() && join_set.is_empty() {
                break;
            }
        }

        if results.len() < total {
            checkpoint.mark_failed(now());
        }
        if let Some(checkpointer) = &self.checkpointer {
            checkpointer.persist(&checkpoint)?;
        }

        Ok(ExecutorOutcome { results, checkpoint })
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// One operation's full lifecycle: resolve deferred references against
/// what has resolved so far, acquire a throttle slot, dispatch, and feed
/// the outcome back to the throttle. Captures the entity's prior state
/// before an update/delete so the rollback generator can restore it.
#[allow(clippy::too_many_arguments)]
async fn execute_one(
    mut op: Operation,
    client: Arc<BamClient>,
    registry: Arc<HandlerRegistry>,
    throttle: Arc<AdaptiveThrottle>,
    resolved: Arc<DashMap<String, i64>>,
    dry_run: bool,
    conflict_resolution: ConflictResolution,
    cancel: ShutdownReceiver,
) -> (String, ExecutionResult, Option<Value>) {
    let row_id = op.row_id.clone();
    let start = Instant::now();

    if cancel.is_cancelled() {
        let result = ExecutionResult::failure(row_id.clone(), op.operation_type, op.object_type, ErrorKind::Fatal, "cancelled before dispatch", 0, false);
        return (row_id, result, None);
    }

    for (kind, producing_row_id) in op.deferred_sources.clone() {
        if let Some(resource_id) = resolved.get(&producing_row_id).map(|entry| *entry) {
            op.resolve_deferred(&DeferredReference { kind, identity: String::new() }, resource_id);
        }
    }

    let mapping = bam_planner::type_map::type_mapping(op.object_type);
    let prior_state = if !dry_run && matches!(op.operation_type, OperationType::Update | OperationType::Delete) {
        match op.resource_id {
            Some(id) => client.get_by_id(mapping.collection, id).await.ok().flatten(),
            None => None,
        }
    } else {
        None
    };

    let permit = throttle.acquire().await;
    let outcome = if dry_run {
        Ok(Some(synthetic_resource_id(&row_id)))
    } else {
        match op.operation_type {
            OperationType::Create => {
                registry.create(&client, &row_id, op.object_type, &op.payload, conflict_resolution).await.and_then(|entity| require_id(&entity)).map(Some)
            }
            OperationType::Update => {
                let resource_id = op.resource_id.unwrap_or_default();
                registry.update(&client, &row_id, op.object_type, resource_id, &op.payload).await.and_then(|entity| require_id(&entity)).map(Some)
            }
            OperationType::Delete => {
                let resource_id = op.resource_id.unwrap_or_default();
                registry.delete(&client, &row_id, op.object_type, resource_id).await.map(|()| op.resource_id)
            }
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;
    drop(permit);

    let result = match outcome {
        Ok(resource_id) => {
            throttle.record_success_latency(duration_ms as f64);
            ExecutionResult::success(row_id.clone(), op.operation_type, op.object_type, resource_id, duration_ms, false)
        }
        Err(err) => {
            throttle.record_failure(err.kind() == ErrorKind::RateLimited);
            ExecutionResult::failure(row_id.clone(), op.operation_type, op.object_type, err.kind(), err.to_string(), duration_ms, false)
        }
    };
    (row_id, result, prior_state)
}

fn synthetic_resource_id(row_id: &str) -> i64 {
    let digest = Sha256::digest(row_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    i64::from_be_bytes(bytes) & i64::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_ids_are_deterministic_and_nonnegative() {
        let a = synthetic_resource_id("row-1");
        let b = synthetic_resource_id("row-1");
        let c = synthetic_resource_id("row-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a >= 0);
    }
}

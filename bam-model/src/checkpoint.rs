//! Durable per-batch progress record (C10), persisted append-only within a
//! session so a crashed or interrupted run can resume without
//! re-executing completed operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub batch_id: String,
    pub operation_index: usize,
    pub total_operations: usize,
    pub completed_operations: usize,
    pub status: CheckpointStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub metadata: BTreeMap<String, String>,
}

impl Checkpoint {
    pub fn start(
        session_id: impl Into<String>,
        batch_id: impl Into<String>,
        total_operations: usize,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            batch_id: batch_id.into(),
            operation_index: 0,
            total_operations,
            completed_operations: 0,
            status: CheckpointStatus::InProgress,
            timestamp,
            metadata: BTreeMap::new(),
        }
    }

    /// Advances the checkpoint after one more operation completes,
    /// regardless of that operation's success; `completed_operations`
    /// tracks attempts accounted for, not successes.
    pub fn advance(&mut self, timestamp: OffsetDateTime) {
        self.operation_index += 1;
        self.completed_operations += 1;
        self.timestamp = timestamp;
        if self.completed_operations >= self.total_operations {
            self.status = CheckpointStatus::Completed;
        }
    }

    pub fn mark_failed(&mut self, timestamp: OffsetDateTime) {
        self.status = CheckpointStatus::Failed;
        self.timestamp = timestamp;
    }

    /// The rocksdb key this checkpoint is stored under: one row per
    /// `(session_id, batch_id)` pair, overwritten on every `advance`.
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.session_id, self.batch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn advancing_past_total_marks_completed() {
        let t0 = datetime!(2026-01-01 00:00:00 UTC);
        let mut checkpoint = Checkpoint::start("s1", "b1", 2, t0);
        assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
        checkpoint.advance(t0);
        assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
        checkpoint.advance(t0);
        assert_eq!(checkpoint.status, CheckpointStatus::Completed);
        assert_eq!(checkpoint.completed_operations, 2);
    }

    #[test]
    fn storage_key_combines_session_and_batch() {
        let checkpoint = Checkpoint::start("s1", "b7", 10, datetime!(2026-01-01 00:00:00 UTC));
        assert_eq!(checkpoint.storage_key(), "s1/b7");
    }
}

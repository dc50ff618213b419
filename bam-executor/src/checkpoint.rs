//! Checkpointer (C10): durable per-session progress, backed by a small
//! embedded `rocksdb` instance under `.checkpoints/` so a crashed or
//! interrupted run can resume without re-executing completed operations.

use std::path::Path;

use bam_errors::{BamError, BamResult};
use bam_model::Checkpoint;
use rocksdb::DB;

pub struct Checkpointer {
    db: DB,
}

impl Checkpointer {
    pub fn open(dir: &Path) -> BamResult<Self> {
        let db = DB::open_default(dir).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to open checkpoint store at {}: {err}", dir.display()),
        })?;
        Ok(Self { db })
    }

    /// Overwrites the `(session_id, batch_id)` row with the latest state.
    pub fn persist(&self, checkpoint: &Checkpoint) -> BamResult<()> {
        let bytes = serde_json::to_vec(checkpoint).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to serialize checkpoint: {err}"),
        })?;
        self.db.put(checkpoint.storage_key(), bytes).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to persist checkpoint: {err}"),
        })
    }

    /// Loads the last persisted checkpoint for a `(session_id, batch_id)`
    /// pair, if any, so a resumed run can skip rows already accounted for.
    pub fn load(&self, session_id: &str, batch_id: &str) -> BamResult<Option<Checkpoint>> {
        let key = format!("{session_id}/{batch_id}");
        let Some(bytes) = self.db.get(&key).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to read checkpoint: {err}"),
        })?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| BamError::Fatal { row_id: String::new(), message: format!("corrupt checkpoint record: {err}") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_model::CheckpointStatus;
    use time::macros::datetime;

    #[test]
    fn persisted_checkpoint_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::open(dir.path()).unwrap();
        let checkpoint = Checkpoint::start("s1", "b1", 10, datetime!(2026-01-01 00:00:00 UTC));
        checkpointer.persist(&checkpoint).unwrap();

        let loaded = checkpointer.load("s1", "b1").unwrap().unwrap();
        assert_eq!(loaded.status, CheckpointStatus::InProgress);
        assert_eq!(loaded.total_operations, 10);
    }

    #[test]
    fn missing_checkpoint_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::open(dir.path()).unwrap();
        assert!(checkpointer.load("nope", "nope").unwrap().is_none());
    }
}

//! Per-session changelog (§6 `.changelogs/`): one newline-delimited-JSON
//! file recording every [`ExecutionResult`] plus the context the rollback
//! generator (C11) and the `history`/`status` subcommands need back —
//! the payload sent and, for update/delete, the entity state captured
//! immediately before the call that overwrote or removed it.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use bam_errors::{BamError, BamResult};
use bam_model::{ExecutionResult, ObjectType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub result: ExecutionResult,
    pub object_type: ObjectType,
    pub payload: Value,
    /// The entity as it existed immediately before an update or delete;
    /// `None` for creates, and for anything that failed before the prior
    /// state could be captured.
    pub prior_state: Option<Value>,
}

pub struct ChangelogWriter {
    file: std::fs::File,
}

impl ChangelogWriter {
    pub fn create(path: &Path) -> BamResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to open changelog {}: {err}", path.display()),
        })?;
        Ok(Self { file })
    }

    pub fn append(&mut self, entry: &ChangelogEntry) -> BamResult<()> {
        let mut line = serde_json::to_vec(entry).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to serialize changelog entry: {err}"),
        })?;
        line.push(b'\n');
        self.file.write_all(&line).map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to append to changelog: {err}"),
        })
    }
}

pub fn read_all(path: &Path) -> BamResult<Vec<ChangelogEntry>> {
    let file = std::fs::File::open(path)
        .map_err(|err| BamError::Fatal { row_id: String::new(), message: format!("failed to open changelog {}: {err}", path.display()) })?;
    BufReader::new(file)
        .lines()
        .filter(|line| line.as_ref().is_ok_and(|l| !l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(|err| BamError::Fatal { row_id: String::new(), message: format!("failed to read changelog: {err}") })?;
            serde_json::from_str(&line)
                .map_err(|err| BamError::Fatal { row_id: String::new(), message: format!("corrupt changelog entry: {err}") })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_model::OperationType;

    #[test]
    fn appended_entries_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.ndjson");
        let mut writer = ChangelogWriter::create(&path).unwrap();
        let entry = ChangelogEntry {
            result: ExecutionResult::success("r1", OperationType::Create, ObjectType::Ip4Block, Some(7), 5, false),
            object_type: ObjectType::Ip4Block,
            payload: serde_json::json!({"cidr": "10.0.0.0/8"}),
            prior_state: None,
        };
        writer.append(&entry).unwrap();
        writer.append(&entry).unwrap();

        let entries = read_all(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].result.row_id, "r1");
    }
}

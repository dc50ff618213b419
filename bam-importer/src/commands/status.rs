//! `status` (§6): print the last persisted checkpoint for a session.

use bam_executor::Checkpointer;

use crate::config::BamConfig;
use crate::exit::ExitCode;

pub fn run(config: &BamConfig, session_id: &str, batch_id: &str) -> anyhow::Result<ExitCode> {
    std::fs::create_dir_all(&config.checkpoint_dir)?;
    let checkpointer = Checkpointer::open(&config.checkpoint_dir)?;
    match checkpointer.load(session_id, batch_id)? {
        Some(checkpoint) => {
            println!(
                "session {session_id}/{batch_id}: {:?}, {}/{} operations, last update {}",
                checkpoint.status, checkpoint.completed_operations, checkpoint.total_operations, checkpoint.timestamp
            );
            Ok(ExitCode::Success)
        }
        None => {
            eprintln!("status: no checkpoint found for {session_id}/{batch_id}");
            Ok(ExitCode::Failure)
        }
    }
}

//! `history` (§6): print a session's changelog entries.

use bam_executor::read_changelog;

use crate::config::BamConfig;
use crate::exit::ExitCode;

pub fn run(config: &BamConfig, session_id: &str, batch_id: &str) -> anyhow::Result<ExitCode> {
    let path = super::changelog_path(config, session_id, batch_id)?;
    if !path.exists() {
        eprintln!("history: no changelog found for {session_id}/{batch_id}");
        return Ok(ExitCode::Failure);
    }
    let entries = read_changelog(&path)?;
    for entry in &entries {
        let status = if entry.result.success { "ok" } else { "failed" };
        println!(
            "{} {} {} {} {}ms{}",
            entry.result.row_id,
            entry.result.operation_type,
            entry.object_type,
            status,
            entry.result.duration_ms,
            entry.result.error_message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
        );
    }
    println!("history: {} entries for {session_id}/{batch_id}", entries.len());
    Ok(ExitCode::Success)
}

//! One module per subcommand (§6). Each takes the already-loaded
//! [`BamConfig`] plus its own CLI arguments and returns the process's
//! [`ExitCode`]; I/O and remote calls live here, not in `main`.

mod apply;
mod export;
mod fix;
mod history;
mod rollback;
mod self_test;
mod status;
mod validate;

pub use apply::run as apply;
pub use export::run as export;
pub use fix::run as fix;
pub use history::run as history;
pub use rollback::run as rollback;
pub use self_test::run as self_test;
pub use status::run as status;
pub use validate::run as validate;

use std::path::{Path, PathBuf};

use crate::config::BamConfig;

/// `.changelogs/<session_id>/<batch_id>.ndjson`, creating the session's
/// directory on first use.
pub(crate) fn changelog_path(config: &BamConfig, session_id: &str, batch_id: &str) -> std::io::Result<PathBuf> {
    let dir = config.changelog_dir.join(session_id);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{batch_id}.ndjson")))
}

/// Reads an input file and runs it through the whitespace sanitizer, the
/// same pre-pass `bam-importer fix` applies in place.
pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)?;
    Ok(bam_util::sanitize::sanitize_csv(&raw))
}

//! `fix` (§6): sanitize an input file's whitespace in place.

use std::path::Path;

use bam_util::sanitize::sanitize_csv_file;

use crate::exit::ExitCode;

pub fn run(input: &Path) -> anyhow::Result<ExitCode> {
    let changed = sanitize_csv_file(input)?;
    if changed {
        println!("fix: sanitized {}", input.display());
    } else {
        println!("fix: {} already clean", input.display());
    }
    Ok(ExitCode::Success)
}

//! `validate` (§6): parse and plan an input file without touching the
//! remote server for anything but the read-only lookups planning itself
//! needs (identity checks, reference resolution). Never dispatches a
//! create/update/delete.

use std::path::Path;

use bam_parser::{parse_csv, ParseMode};

use crate::config::BamConfig;
use crate::exit::ExitCode;
use crate::pipeline::Pipeline;

pub async fn run(config: &BamConfig, input: &Path, strict: bool) -> anyhow::Result<ExitCode> {
    let text = super::read_input(input)?;
    let mode = if strict { ParseMode::Strict } else { ParseMode::Lenient };
    let outcome = match parse_csv(&text, mode) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("parse failed: {err}");
            return Ok(ExitCode::Failure);
        }
    };

    for error in &outcome.errors {
        eprintln!("{}: {} ({})", error.row_id, error.message, error.field);
    }
    if let Some(warning) = &outcome.version_warning {
        eprintln!("warning: {warning}");
    }

    let pipeline = Pipeline::build(config)?;
    let plan = pipeline.planner.plan(&outcome.rows).await;
    for error in &plan.errors {
        eprintln!("{}: {}", error.row_id, error.source);
    }

    let failed = !outcome.errors.is_empty() || !plan.errors.is_empty();
    if failed {
        println!("validate: {} row(s) planned, {} parse error(s), {} plan error(s)", plan.operations.len(), outcome.errors.len(), plan.errors.len());
        return Ok(ExitCode::Failure);
    }

    println!("validate: OK, {} operation(s) planned", plan.operations.len());
    Ok(ExitCode::Success)
}

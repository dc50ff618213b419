//! `self-test` (§6): exercises connectivity and the handler registry
//! bootstrap without touching an input file, so a deployment can be
//! smoke-tested before a real run.

use bam_client::pagination::PageLimits;

use crate::config::BamConfig;
use crate::exit::ExitCode;
use crate::pipeline::Pipeline;

pub async fn run(config: &BamConfig) -> anyhow::Result<ExitCode> {
    let pipeline = match Pipeline::build(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("self-test: failed to build pipeline: {err}");
            return Ok(ExitCode::Failure);
        }
    };
    println!("self-test: handler registry covers every object type");

    match pipeline.client.list("configurations", &[], PageLimits { max_items: Some(1), max_pages: Some(1) }).await {
        Ok(_) => {
            println!("self-test: connected to {}", config.connection.url);
            Ok(ExitCode::Success)
        }
        Err(err) => {
            eprintln!("self-test: connectivity check failed: {err}");
            Ok(ExitCode::Failure)
        }
    }
}

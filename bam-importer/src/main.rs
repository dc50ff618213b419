//! `bam-importer` (§6): parse, validate, apply, roll back, and export
//! BlueCat Address Manager CSV imports against the v2 REST API.

mod cli;
mod commands;
mod config;
mod exit;
mod logging;
mod orphan;
mod pipeline;
mod remote_lookup;

use clap::Parser;

use cli::{Cli, Command};
use exit::ExitCode;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bam-importer: {err}");
            std::process::exit(ExitCode::InvalidArgs.code());
        }
    };

    logging::init(&config.log_level, config.log_format);

    let result = dispatch(&config, &cli.command).await;
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("bam-importer: {err}");
            ExitCode::Failure
        }
    };
    std::process::exit(code.code());
}

async fn dispatch(config: &config::BamConfig, command: &Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Validate { input, strict } => commands::validate(config, input, *strict).await,
        Command::Apply { input, dry_run, resume, no_resume, yes, session_id, batch_id } => {
            let resume = *resume && !*no_resume;
            commands::apply(config, input, *dry_run, resume, *yes, session_id, batch_id).await
        }
        Command::Rollback { session_id, batch_id, dry_run } => commands::rollback(config, session_id, batch_id, *dry_run).await,
        Command::Export { configuration, output, object_type } => {
            commands::export(config, configuration, output, object_type.as_deref()).await
        }
        Command::Status { session_id, batch_id } => commands::status(config, session_id, batch_id),
        Command::History { session_id, batch_id } => commands::history(config, session_id, batch_id),
        Command::SelfTest => commands::self_test(config).await,
        Command::Fix { input } => commands::fix(input),
        Command::Version => {
            println!("bam-importer {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::Success)
        }
    }
}

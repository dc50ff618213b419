//! Command-line surface (§6): `validate`, `apply`, `rollback`, `export`,
//! `status`, `history`, `self-test`, `fix`, `version`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bam-importer", version, about = "BlueCat Address Manager CSV reconciliation pipeline")]
pub struct Cli {
    /// Path to a YAML configuration file, applied after defaults and
    /// before environment variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "BAM_URL", global = true)]
    pub url: Option<String>,

    #[arg(long, env = "BAM_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "BAM_PASSWORD", global = true)]
    pub password: Option<String>,

    /// Allow deletes of protected kinds (configuration, view, block,
    /// network, zone).
    #[arg(long, global = true)]
    pub allow_dangerous_operations: bool,

    /// Bypass the resolver's positive/negative caches for this run.
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and plan the input without touching the remote server.
    Validate {
        input: PathBuf,
        #[arg(long)]
        strict: bool,
    },
    /// Plan and execute the input against the remote server.
    Apply {
        input: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        resume: bool,
        #[arg(long)]
        no_resume: bool,
        /// Bypasses the safe-mode confirmation gate for protected deletes.
        #[arg(long)]
        yes: bool,
        #[arg(long, default_value = "session")]
        session_id: String,
        #[arg(long, default_value = "batch-1")]
        batch_id: String,
    },
    /// Replay a prior session's changelog as an inverse operation plan.
    Rollback {
        #[arg(long)]
        session_id: String,
        #[arg(long, default_value = "batch-1")]
        batch_id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Export a configuration's resource tree to the input CSV schema.
    Export {
        configuration: String,
        output: PathBuf,
        #[arg(long)]
        object_type: Option<String>,
    },
    /// Print the last checkpoint for a session.
    Status {
        #[arg(long)]
        session_id: String,
        #[arg(long, default_value = "batch-1")]
        batch_id: String,
    },
    /// Print a session's changelog entries.
    History {
        #[arg(long)]
        session_id: String,
        #[arg(long, default_value = "batch-1")]
        batch_id: String,
    },
    /// Exercise connectivity and the handler registry without an input file.
    SelfTest,
    /// Sanitize an input file's whitespace in place.
    Fix { input: PathBuf },
    /// Print version information.
    Version,
}

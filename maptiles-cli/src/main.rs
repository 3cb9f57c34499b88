//! maptiles CLI - Command-line interface
//!
//! Submits and tracks map tile download tasks. Every task command prints a
//! JSON response envelope (`{"code", "message", "data"}`) on stdout and
//! exits with status 1 when `code` is not zero. Logs go to stderr and the
//! configured log file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use maptiles::error::ErrorCode;

use commands::config::ConfigCommands;
use commands::count::CountArgs;
use commands::submit::SubmitArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "maptiles")]
#[command(version = maptiles::VERSION)]
#[command(about = "Submit and track map tile download tasks", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.maptiles/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, save and launch a download task
    Submit(SubmitArgs),

    /// Show one task
    Status {
        /// Id of the requesting user
        #[arg(long)]
        user: i64,

        /// Task id
        #[arg(long)]
        task: i64,
    },

    /// List a user's tasks
    List {
        /// Id of the requesting user
        #[arg(long)]
        user: i64,
    },

    /// Cancel an active task
    Cancel {
        /// Id of the requesting user
        #[arg(long)]
        user: i64,

        /// Task id
        #[arg(long)]
        task: i64,
    },

    /// Record worker progress (called by the download worker)
    Progress {
        /// Task id
        #[arg(long)]
        task: i64,

        /// Worker token received at launch
        #[arg(long)]
        token: String,

        /// Completion percentage, 0 to 100
        #[arg(long)]
        percent: f64,

        /// Report that the worker gave up
        #[arg(long)]
        failed: bool,
    },

    /// Estimate the number of tiles in a bounding box
    Count(CountArgs),

    /// Fail orphaned and stalled tasks
    Reconcile {
        /// Keep sweeping on the configured interval until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) if code.is_ok() => {}
        Ok(_) => process::exit(1),
        Err(e) => e.exit(),
    }
}

fn dispatch(cli: Cli) -> Result<ErrorCode, CliError> {
    let config_path = cli.config.as_deref();
    let open_runner = || CliRunner::new(config_path, cli.debug);

    match cli.command {
        Commands::Submit(args) => commands::submit::run(&open_runner()?, args),
        Commands::Status { user, task } => commands::query::run_status(&open_runner()?, user, task),
        Commands::List { user } => commands::query::run_list(&open_runner()?, user),
        Commands::Cancel { user, task } => commands::query::run_cancel(&open_runner()?, user, task),
        Commands::Progress {
            task,
            token,
            percent,
            failed,
        } => commands::progress::run(&open_runner()?, task, &token, percent, failed),
        Commands::Reconcile { watch } => commands::reconcile::run(&open_runner()?, watch),
        Commands::Count(args) => commands::count::run(args),
        Commands::Config { command } => {
            commands::config::run(command, config_path).map(|()| ErrorCode::Ok)
        }
    }
}

// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use censo_ingest::{load_years, LoadOptions, LoadStatus};
use censo_model::CensusYear;
use censo_server::AppState;
use censo_store::Store;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "censo")]
#[command(about = "School census microdata loader and API server")]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one or more census-year extracts into the database.
    Load {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        db: PathBuf,
        /// Census year; repeatable. At least one is required.
        #[arg(long = "year", required = true)]
        years: Vec<i64>,
        /// Append instead of replacing each year's existing records.
        #[arg(long, default_value_t = false)]
        keep_existing: bool,
    },
    /// Serve the HTTP API over an existing database.
    Serve {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Secret used to sign pagination cursors. Cursors issued under a
        /// different secret are rejected.
        #[arg(long, default_value = "censo-dev-secret")]
        cursor_secret: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_load(
    data_dir: PathBuf,
    db: PathBuf,
    years: Vec<i64>,
    keep_existing: bool,
    json: bool,
) -> ExitCode {
    let parsed: Result<Vec<CensusYear>, _> = years.iter().map(|y| CensusYear::parse(*y)).collect();
    let years = match parsed {
        Ok(years) => years,
        Err(e) => {
            eprintln!("censo load: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut store = match Store::open(&db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("censo load: cannot open {}: {e}", db.display());
            return ExitCode::FAILURE;
        }
    };
    let mut opts = LoadOptions::new(data_dir);
    opts.clear_existing = !keep_existing;

    let outcomes = load_years(&mut store, &opts, &years);
    for outcome in &outcomes {
        if json {
            match serde_json::to_string(outcome) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("censo load: cannot render outcome: {e}"),
            }
        } else {
            let status = match &outcome.status {
                LoadStatus::Success => "loaded".to_string(),
                LoadStatus::SkippedMissingSource => "skipped (source missing)".to_string(),
                LoadStatus::Failed(reason) => format!("failed: {reason}"),
            };
            println!(
                "{}: {status} ({} rows read, {} institutions written, {} rows skipped)",
                outcome.year, outcome.rows_read, outcome.groups_written, outcome.report.skipped_rows
            );
        }
    }

    let any_succeeded = outcomes
        .iter()
        .any(|o| o.status == LoadStatus::Success);
    if any_succeeded || outcomes.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_serve(db: PathBuf, bind: SocketAddr, cursor_secret: String) -> ExitCode {
    let state = match AppState::open(&db, cursor_secret.into_bytes()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("censo serve: cannot open {}: {e}", db.display());
            return ExitCode::FAILURE;
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("censo serve: runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(censo_server::run(bind, state)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("censo serve: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Load {
            data_dir,
            db,
            years,
            keep_existing,
        } => run_load(data_dir, db, years, keep_existing, cli.json),
        Commands::Serve {
            db,
            bind,
            cursor_secret,
        } => run_serve(db, bind, cursor_secret),
    }
}

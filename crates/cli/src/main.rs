// foodshare CLI - clean, load and query food donation data

mod exit_codes;
mod pipeline;
mod query;
mod writes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use foodshare_clean::CleanError;
use foodshare_io::IoError;
use foodshare_store::StoreError;

use exit_codes::{clean_exit_code, io_exit_code, store_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

use query::ReportOptions;
use writes::{ClaimCommands, ListingCommands};

/// Store location used when `--db` is not given; matches the default `[output]` layout.
const DEFAULT_DB: &str = "cleaned_outputs/food_waste.db";

#[derive(Parser)]
#[command(name = "foodshare")]
#[command(about = "Clean food donation CSVs, load them into SQLite and query the result")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `info` or `foodshare_clean=debug`
    #[arg(long, global = true, env = "FOODSHARE_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the four input tables, write artifacts and rebuild the store
    #[command(after_help = "\
Examples:
  foodshare run pipeline.toml
  foodshare run pipeline.toml --json
  foodshare run pipeline.toml --output summary.json")]
    Run {
        /// Path to the pipeline TOML config
        config: PathBuf,

        /// Output the run summary as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Also write the run summary JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a config and the headers of its inputs without running
    #[command(after_help = "\
Examples:
  foodshare validate pipeline.toml")]
    Validate {
        /// Path to the pipeline TOML config
        config: PathBuf,
    },

    /// Run a canned report against the store (`list` shows them all)
    #[command(after_help = "\
Examples:
  foodshare report list
  foodshare report claim-status --db out/food_waste.db
  foodshare report provider-contacts --city Springfield
  foodshare report expiring-soon --today 2025-03-18 --json")]
    Report {
        /// Report name, or `list`
        name: String,

        #[command(flatten)]
        options: ReportOptions,
    },

    /// Browse listings, optionally filtered
    #[command(after_help = "\
Examples:
  foodshare listings --city Springfield
  foodshare listings --food-type vegan --meal-type dinner --json")]
    Listings {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        food_type: Option<String>,

        #[arg(long)]
        meal_type: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Row counts and the distinct values usable as listing filters
    Overview {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Add listings or change their quantity
    #[command(subcommand)]
    Listing(ListingCommands),

    /// Add or delete claims
    #[command(subcommand)]
    Claim(ClaimCommands),
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Run { config, json, output } => pipeline::cmd_run(config, json, output),
        Commands::Validate { config } => pipeline::cmd_validate(config),
        Commands::Report { name, options } => query::cmd_report(&name, options),
        Commands::Listings { db, city, food_type, meal_type, json } => {
            query::cmd_listings(db, city, food_type, meal_type, json)
        }
        Commands::Overview { db, json } => query::cmd_overview(db, json),
        Commands::Listing(cmd) => writes::cmd_listing(cmd),
        Commands::Claim(cmd) => writes::cmd_claim(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn clean(err: CleanError) -> Self {
        let code = clean_exit_code(&err);
        let hint = match &err {
            CleanError::MissingColumns { table, .. } => {
                Some(format!("the {table} CSV header must name every required column; no outputs were written"))
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn file(err: IoError) -> Self {
        match err {
            IoError::Clean(e) => Self::clean(e),
            other => Self { code: io_exit_code(&other), message: other.to_string(), hint: None },
        }
    }

    /// Create error from store error with proper exit code.
    pub fn store(err: StoreError) -> Self {
        let code = store_exit_code(&err);
        let hint = match &err {
            StoreError::Io { .. } => Some("build the store first with `foodshare run <config>`".to_string()),
            StoreError::Integrity { .. } => Some("the previous store was left in place".to_string()),
            StoreError::Rejected(_) => {
                Some("ids must be unique and reference existing providers, receivers and listings".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Serialize `value` as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}

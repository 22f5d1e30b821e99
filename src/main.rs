//! # Journal Recall CLI (`recall`)
//!
//! The `recall` binary loads journal entries from CSV exports into Postgres
//! with an embedding per entry, then searches or summarizes them.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./config/recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall init` | Create the pgvector extension, entries table and indexes |
//! | `recall load --file <csv>` | Embed and store entries not yet loaded |
//! | `recall search --query "<q>"` | Print the entries nearest to a query |
//! | `recall summarize --query "<q>"` | Summarize the nearest entries with a chat model |
//! | `recall get <id>` | Print a single stored entry |
//! | `recall stats` | Show entry counts and date range |
//!
//! ## Examples
//!
//! ```bash
//! # Estimate tokens and cost without calling the API
//! recall load --file ./journal.csv --dry-run
//!
//! # Load, then ask about it
//! recall load --file ./journal.csv
//! recall search --query "the week we moved"
//! recall summarize --query "how I felt about running"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use journal_recall::config::{self, DEFAULT_CONFIG_PATH};
use journal_recall::progress::ProgressMode;
use journal_recall::{get, load, logging, migrate, search, stats, summarize};

/// Journal Recall: semantic search and summaries over journal entries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/recall.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Journal Recall — semantic search and summaries over journal entries",
    version,
    long_about = "Journal Recall loads journal entries from a CSV export, embeds each one \
    with the OpenAI embeddings API, stores them in Postgres with pgvector, and answers \
    similarity searches and summary requests over them."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/recall.toml`. If that default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Enables the `vector` extension and creates the entries table and its
    /// indexes. Safe to run more than once.
    Init,

    /// Load entries from a CSV export.
    ///
    /// Prints a token and cost estimate, then embeds and inserts every
    /// record whose ID is not already stored. Existing IDs are skipped even
    /// if their text has changed.
    Load {
        /// CSV file with columns id, text, creator_id, created_at, updated_at.
        #[arg(short, long)]
        file: PathBuf,

        /// Print the estimate only; no API calls and no database writes.
        #[arg(short, long)]
        dry_run: bool,

        /// Only consider the first N records of the file.
        #[arg(long)]
        limit: Option<usize>,

        /// Progress reporting on stderr.
        #[arg(long, value_enum, default_value = "auto")]
        progress: ProgressMode,
    },

    /// Search entries by meaning.
    Search {
        /// Text to search for.
        #[arg(short, long)]
        query: String,

        /// Maximum number of results (default from config).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Summarize the entries nearest to a query.
    Summarize {
        /// Topic to summarize.
        #[arg(short, long)]
        query: String,

        /// Number of entries used as context (default from config).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print a single entry by ID.
    Get {
        /// Entry ID.
        id: i32,
    },

    /// Show entry counts, date range and per-creator totals.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Load {
            file,
            dry_run,
            limit,
            progress,
        } => {
            load::run_load(&cfg, &file, dry_run, limit, progress).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Summarize { query, limit } => {
            summarize::run_summarize(&cfg, &query, limit).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use polyfield::config::Config;
use polyfield::db::SqlxConnection;
use polyfield::model::ModelRegistry;
use polyfield::sync::{ColumnLedger, StdinPrompter, SyncCommand, SyncOptions};

#[derive(Parser)]
#[command(name = "polyfield", version, about = "Per-language model fields and schema sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect new translatable fields or languages and sync the database structure
    SyncDb {
        /// Assume YES on all queries
        #[arg(short = 'y', long = "yes")]
        yes: bool,

        /// Language code of the existing untranslated data
        #[arg(short = 'd', long = "default", value_name = "CODE")]
        default: Option<String>,
    },
}

fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Logs go to stderr, the operator report to stdout
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyfield=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::SyncDb { yes, default } => sync_db(yes, default),
    }
}

fn sync_db(assume_yes: bool, default_language: Option<String>) -> Result<()> {
    let config = Config::from_env()?;

    let registry = ModelRegistry::load(&config.models_file, &config.languages)
        .with_context(|| format!("Failed to load models from {}", config.models_file))?;
    let ledger = ColumnLedger::load(&config.ledger_file)
        .with_context(|| format!("Failed to read column ledger {}", config.ledger_file))?;

    let mut conn =
        SqlxConnection::connect(&config.database_url).context("Failed to connect to database")?;

    let options = SyncOptions {
        assume_yes,
        default_language,
        placeholder: config.placeholder.clone(),
    };
    let mut command = SyncCommand::new(config.languages.clone(), options, ledger);

    let report = command.run(
        &mut conn,
        &registry,
        &mut StdinPrompter,
        &mut io::stdout().lock(),
    )?;

    command
        .ledger()
        .save(&config.ledger_file)
        .with_context(|| format!("Failed to save column ledger {}", config.ledger_file))?;
    conn.close()?;

    info!(
        done = report.done().count(),
        failed = report.failed().count(),
        "sync-db finished"
    );
    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use convey_core::{ConversationRanker, LedgerAggregator, PlainTextFormatter, build_conversation};
use convey_db::{Database, Fixture};
use convey_types::RecordHash;
use convey_types::api::{BestQuery, LedgerSort, Period, RecentQuery};

mod config;

use config::Config;

/// Inspect the token economy of a conversation database.
#[derive(Parser, Debug)]
#[command(name = "convey")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database file (overrides CONVEY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one conversation as a ranked reply tree
    Conversation {
        /// Conversation hash (URL-safe base64)
        hash: String,
    },
    /// Highest-yield conversations created in a period
    Best {
        /// all, year or day (anything else means day)
        #[arg(short, long, default_value = "day")]
        period: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Most recently created conversations
    Recent {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Per-alias token balances
    Ledger {
        /// alias, minted, burned, bought, sold, earned, spent or balance
        #[arg(short, long, default_value = "balance")]
        sort: String,
    },
    /// Seed the database from a JSON fixture
    Import { fixture: PathBuf },
}

fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convey=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            // Core failures never leak their detail past the log.
            match err.downcast_ref::<convey_core::Error>() {
                Some(core) => eprintln!("{}", core.public_message()),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db_path = cli.db.unwrap_or(config.db_path);
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Conversation { hash } => {
            let hash: RecordHash = hash
                .parse()
                .map_err(|e| convey_core::Error::not_found(format!("conversation {}: {}", hash, e)))?;
            print_json(&build_conversation(&db, &PlainTextFormatter, &hash)?)
        }
        Commands::Best { period, limit } => {
            let query = BestQuery {
                period: Period::parse_lenient(&period),
                limit: limit.unwrap_or(config.default_limit),
            };
            let page = ConversationRanker::new(&db).best_page(&query, chrono::Utc::now())?;
            print_json(&page)
        }
        Commands::Recent { limit } => {
            let query = RecentQuery {
                limit: limit.unwrap_or(config.default_limit),
            };
            print_json(&ConversationRanker::new(&db).recent_page(&query)?)
        }
        Commands::Ledger { sort } => {
            let page = LedgerAggregator::new(&db).page(LedgerSort::parse_lenient(&sort))?;
            print_json(&page)
        }
        Commands::Import { fixture } => {
            let json = std::fs::read_to_string(&fixture)?;
            let summary = db.import(&Fixture::from_json(&json)?)?;
            info!("Seeded {} from {}", db_path.display(), fixture.display());
            println!(
                "imported {} conversations, {} messages, {} ledger aliases",
                summary.conversations, summary.messages, summary.aliases
            );
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

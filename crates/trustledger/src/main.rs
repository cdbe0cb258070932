//! CLI entry point for the trustledger host.
//!
//! `apply` reads a JSON array of calls from stdin and writes one JSON result
//! per call to stdout. With a journal, state persists across runs in a
//! snapshot beside it. Logs go to stderr.

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use trustledger::{Batch, Ledger, LedgerFiles};
use trustledger_core::config::LedgerConfig;
use trustledger_core::events::TracingSink;
use trustledger_core::EventSink;
use trustledger_journal::{FileJournalStore, JournalStore};

#[derive(Parser)]
#[command(name = "trustledger")]
#[command(about = "Identity, reputation, and validation ledger for autonomous agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: trustledger).
    #[arg(short, long, default_value = "trustledger", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a batch of calls (reads a JSON array from stdin).
    Apply {
        /// Persist events to this journal and state to a snapshot beside it.
        #[arg(long)]
        journal: Option<String>,
    },
    /// Verify the hash chain of a journal file.
    Verify {
        #[arg(long)]
        journal: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LedgerConfig::load(&cli.config)?;
    init_tracing(&config);

    match cli.command {
        Command::Apply { journal } => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let calls: Vec<serde_json::Value> = serde_json::from_str(&input)?;
            match journal.or_else(|| config.journal_path.clone()) {
                Some(path) => {
                    let files = LedgerFiles::new(path);
                    let mut ledger = files.open()?;
                    let persisted = ledger.sink().len();
                    run_batch(&mut ledger, calls);
                    files.save(ledger, persisted)?;
                }
                None => {
                    tracing::info!("No journal configured; events are logged only");
                    run_batch(&mut Ledger::new(TracingSink), calls);
                }
            }
        }
        Command::Verify { journal } => {
            let loaded = FileJournalStore::new(&journal).load()?;
            tracing::info!(path = %journal, entries = loaded.len(), "Journal verified");
            println!(
                "{}",
                json!({ "entries": loaded.len(), "head": loaded.head() })
            );
        }
    }

    Ok(())
}

fn init_tracing(config: &LedgerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_batch<S: EventSink>(ledger: &mut Ledger<S>, calls: Vec<serde_json::Value>) {
    tracing::info!(calls = calls.len(), "Applying batch");
    let mut failed = 0usize;
    for result in Batch::new().run(ledger, calls) {
        let line = match result {
            Ok(outcome) => json!({ "ok": outcome }),
            Err(e) => {
                failed += 1;
                json!({ "error": e.to_string() })
            }
        };
        println!("{line}");
    }
    tracing::info!(failed, "Batch complete");
}

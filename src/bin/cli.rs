//! shelfkv CLI
//!
//! Command-line interface for operating an `i64 → i64` block index file.

use clap::{Parser, Subcommand};
use shelfkv::{BlockIndex, Command, Config, Outcome, Result, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// shelfkv CLI
#[derive(Parser, Debug)]
#[command(name = "shelfkv-cli")]
#[command(about = "Operate a disk-resident ordered multimap")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./shelfkv_data")]
    data_dir: String,

    /// Store name inside the data directory
    #[arg(short, long, default_value = "index")]
    store: String,

    /// Fail instead of creating a missing store
    #[arg(long)]
    no_create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a key-value pair
    Insert {
        /// The key
        #[arg(allow_negative_numbers = true)]
        key: i64,

        /// The value
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Erase a key-value pair
    Erase {
        /// The key
        #[arg(allow_negative_numbers = true)]
        key: i64,

        /// The value
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Print every value stored under a key
    Query {
        /// The key to look up
        #[arg(allow_negative_numbers = true)]
        key: i64,
    },

    /// Print every pair in order
    List,

    /// Print chain statistics
    Stats,

    /// Check chain invariants
    Verify,
}

impl From<Commands> for Command<i64, i64> {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Insert { key, value } => Command::Insert { key, value },
            Commands::Erase { key, value } => Command::Erase { key, value },
            Commands::Query { key } => Command::Query { key },
            Commands::List => Command::List,
            Commands::Stats => Command::Stats,
            Commands::Verify => Command::Verify,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shelfkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .create_if_missing(!args.no_create)
        .sync_strategy(SyncStrategy::Never)
        .build();

    let mut index: BlockIndex<i64, i64> = BlockIndex::open(&config, &args.store)?;

    let command = Command::from(args.command);
    let outcome = index.execute(command)?;

    if command.is_mutation() {
        tracing::info!(command = command.name(), store = %index.path().display(), "Applied");
    }

    match outcome {
        Outcome::Done => {}
        Outcome::Values(values) => {
            let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("{}", line.join(" "));
        }
        Outcome::Pairs(pairs) => {
            for (key, value) in pairs {
                println!("{}\t{}", key, value);
            }
        }
        Outcome::Stats(stats) => {
            println!("blocks:     {}", stats.blocks);
            println!("entries:    {}", stats.entries);
            println!("slots:      {}", stats.slot_count);
            println!("free slots: {}", stats.free_slots);
        }
    }

    // close() fsyncs, so per-write syncing is skipped above
    index.close()
}

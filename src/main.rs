use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use types::Virtue;

mod cli;
mod completion;
mod config;
mod gateway;
mod insight;
mod journal;
mod kv;
mod stats;
mod store;
mod types;

#[derive(Parser)]
#[command(name = "virtus")]
#[command(version)]
#[command(about = "Daily virtue journal with AI feedback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a .virtus directory
    Init {
        /// Directory to initialize .virtus in
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// Record today's reflection
    Checkin {
        /// Virtue practiced (English or Spanish name)
        virtue: Virtue,

        /// What you did and how it went
        reflection: String,
    },

    /// Show recent entries
    List {
        /// Maximum results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show progress dashboard
    Stats {
        /// Skip the AI weekly insight
        #[arg(long)]
        no_insight: bool,
    },

    /// Show the weekly insight
    Insight,

    /// List the virtues you can practice
    Virtues,

    /// Export entries to stdout
    Export {
        /// Output format
        #[arg(short, long, default_value = "json", value_parser = ["json", "md"])]
        format: String,
    },

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,

        /// Write to the global config instead of this journal's
        #[arg(short, long)]
        global: bool,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("virtus=warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path } => cli::journal::run_init(&path),
        Commands::Checkin { virtue, reflection } => cli::journal::run_checkin(virtue, &reflection),
        Commands::List { limit } => cli::journal::run_list(limit),
        Commands::Stats { no_insight } => cli::journal::run_stats(!no_insight),
        Commands::Insight => cli::journal::run_insight(),
        Commands::Virtues => cli::journal::run_virtues(),
        Commands::Export { format } => cli::journal::run_export(&format),
        Commands::Config { key, value, global } => {
            cli::config::run_config(key.as_deref(), value.as_deref(), global)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

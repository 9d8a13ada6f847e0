//! Duovault CLI
//!
//! Manage an Ethereum + Solana key vault from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duovault::Chain;

mod commands;

#[derive(Parser)]
#[command(name = "duovault")]
#[command(about = "Duovault - one recovery phrase, Ethereum and Solana keys")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Custom vault store file path
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault with a fresh recovery phrase
    Init,

    /// Create a vault from an existing recovery phrase
    Import,

    /// List derived accounts
    Accounts {
        /// Only show one chain
        #[arg(long)]
        chain: Option<Chain>,
    },

    /// Derive the next account on a chain
    Derive {
        #[arg(long)]
        chain: Chain,
    },

    /// Sign a message with an account
    Sign {
        #[arg(long)]
        chain: Chain,

        /// Account index
        #[arg(short, long, default_value = "0")]
        index: u32,

        /// Message to sign (UTF-8)
        message: String,
    },

    /// Show the recovery phrase
    ExportMnemonic {
        /// Write to a file instead of the screen
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the vault password
    ChangePassword,

    /// Show or update configuration
    Config {
        /// Idle minutes before auto-lock (0 disables)
        #[arg(long)]
        auto_lock: Option<u32>,

        /// Words in generated phrases (12 or 24)
        #[arg(long)]
        words: Option<u32>,

        /// Format version for newly sealed vaults (1 or 2)
        #[arg(long)]
        vault_version: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => duovault::config::default_config_path()?,
    };

    if let Commands::Config {
        auto_lock,
        words,
        vault_version,
    } = cli.command
    {
        return commands::config::run(&config_path, auto_lock, words, vault_version);
    }

    let ctx = commands::Context::load(&config_path, cli.store)?;

    match cli.command {
        Commands::Init => commands::init::run(&ctx, false),
        Commands::Import => commands::init::run(&ctx, true),
        Commands::Accounts { chain } => commands::accounts::run(&ctx, chain),
        Commands::Derive { chain } => commands::derive::run(&ctx, chain),
        Commands::Sign {
            chain,
            index,
            message,
        } => commands::sign::run(&ctx, chain, index, &message),
        Commands::ExportMnemonic { output } => commands::export::run(&ctx, output.as_deref()),
        Commands::ChangePassword => commands::password::run(&ctx),
        Commands::Config { .. } => Ok(()),
    }
}

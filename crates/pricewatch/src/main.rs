// Copyright 2026 Pricewatch Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use pricewatch::cli;
use pricewatch::config::Config;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pricewatch",
    about = "Pricewatch: track product prices and get alerted when they drop",
    version,
    after_help = "Run 'pricewatch <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Database path (overrides PRICEWATCH_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a product to monitor
    Add {
        /// Product page URL
        url: String,
        /// Alert when the price is at or below this value
        #[arg(long, short)]
        threshold: Decimal,
        /// Display name (scraped from the page when omitted)
        #[arg(long, short)]
        name: Option<String>,
    },
    /// List registered products
    List,
    /// Check every product once
    Check,
    /// Check now, then repeatedly until interrupted
    Start {
        /// Hours between checks
        #[arg(long, short, default_value_t = cli::start::DEFAULT_INTERVAL_HOURS)]
        interval: u64,
    },
    /// Show price history and overall change per product
    Report,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("PRICEWATCH_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("PRICEWATCH_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("PRICEWATCH_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("PRICEWATCH_NO_COLOR", "1");
    }

    init_tracing();

    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    let result = match cli.command {
        Commands::Add {
            url,
            threshold,
            name,
        } => cli::add_cmd::run(&config, &url, threshold, name.as_deref()).await,
        Commands::List => cli::list_cmd::run(&config).await,
        Commands::Check => cli::check_cmd::run(&config).await,
        Commands::Start { interval } => cli::start::run(&config, interval).await,
        Commands::Report => cli::report_cmd::run(&config).await,
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pricewatch", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let default = if cli::output::is_verbose() {
        "pricewatch=debug"
    } else if cli::output::is_quiet() || cli::output::is_json() {
        "pricewatch=warn"
    } else {
        "pricewatch=info"
    };
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new(default)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

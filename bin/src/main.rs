//! quiver CLI - cached historical quotes and exchange rates.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod display;

use config::Settings;
use display::ClassArg;

#[derive(Parser)]
#[command(name = "quiver")]
#[command(about = "Cache historical quotes and exchange rates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file. Defaults to <config dir>/quiver/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory, overriding the settings file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh stale series (the watch list when no instrument is given)
    Refresh {
        /// Instruments (e.g., IBM, EUR_USD, CRYPTO_BTC_USD)
        instruments: Vec<String>,

        /// Series category (e.g., daily, fx_daily, digital_weekly)
        #[arg(short, long, default_value = "daily")]
        category: String,

        /// Days a cached series may lag before it is fetched again
        #[arg(short, long, default_value = "1")]
        max_gap: u32,

        /// Write a JSON report of the batch to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print cached rows of a series
    Show {
        /// Instrument identifier
        instrument: String,

        /// Series category
        #[arg(short, long, default_value = "daily")]
        category: String,

        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,

        /// Only print the last N rows
        #[arg(short, long)]
        tail: Option<usize>,
    },

    /// Show the metadata of a cached series
    Info {
        /// Instrument identifier
        instrument: String,

        /// Series category
        #[arg(short, long, default_value = "daily")]
        category: String,
    },

    /// List cached series
    List {
        /// Filter by asset class
        #[arg(long, value_enum)]
        class: Option<ClassArg>,
    },

    /// List known currencies
    Currencies {
        /// Filter by asset class (fx or digital)
        #[arg(long, value_enum)]
        class: Option<ClassArg>,

        /// Search pattern
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Exchange rate between two currencies from the cache
    Rate {
        /// Base currency code
        from: String,

        /// Quote currency code
        to: String,

        /// Series granularity (daily, weekly, monthly)
        #[arg(short, long, default_value = "daily")]
        granularity: String,

        /// Start date (YYYY-MM-DD); prints a range instead of the latest rate
        #[arg(short, long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD); prints a range instead of the latest rate
        #[arg(short, long)]
        end: Option<String>,
    },

    /// Search the provider for symbols
    Search {
        /// Keywords, ISIN or ticker fragments
        keywords: Vec<String>,
    },

    /// Fill cached equity metadata with symbol search results
    Enrich {
        /// Symbols to enrich (all cached equities when omitted)
        symbols: Vec<String>,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) | (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let crates = [
        "quiver",
        "quiver_lib",
        "quiver_fetch",
        "quiver_store",
        "quiver_fx",
        "quiver_refresh",
    ];
    let directives = crates
        .iter()
        .map(|name| format!("{name}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,{directives}"))),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = Settings::load(cli.config.as_deref())?;
    let data_dir = cli.data_dir;

    match command {
        Commands::Refresh {
            instruments,
            category,
            max_gap,
            report,
        } => {
            commands::refresh::refresh(
                &settings,
                data_dir,
                &instruments,
                &category,
                max_gap,
                report,
                cli.quiet,
            )
            .await
        }
        Commands::Show {
            instrument,
            category,
            start,
            end,
            tail,
        } => {
            commands::show::show_series(
                &settings,
                data_dir,
                &instrument,
                &category,
                start.as_deref(),
                end.as_deref(),
                tail,
            )
            .await
        }
        Commands::Info {
            instrument,
            category,
        } => commands::info::show_info(&settings, data_dir, &instrument, &category).await,
        Commands::List { class } => commands::list::list_series(&settings, data_dir, class).await,
        Commands::Currencies { class, search } => {
            commands::currencies::list_currencies(class, search.as_deref());
            Ok(())
        }
        Commands::Rate {
            from,
            to,
            granularity,
            start,
            end,
        } => {
            commands::rate::show_rate(
                &settings,
                data_dir,
                &from,
                &to,
                &granularity,
                start.as_deref(),
                end.as_deref(),
            )
            .await
        }
        Commands::Search { keywords } => {
            commands::search::search(&settings, &keywords.join(" ")).await
        }
        Commands::Enrich { symbols } => {
            commands::enrich::enrich(&settings, data_dir, &symbols, cli.quiet).await
        }
    }
}

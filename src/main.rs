use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use xconv::cli::convert::parse_value;
use xconv::core::history::DEFAULT_HISTORY_DAYS;
use xconv::core::log::init_logging;
use xconv::core::{Category, Coin};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Use built-in crypto prices instead of fetching live ones
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xconv::AppCommand {
    fn from(cmd: Commands) -> xconv::AppCommand {
        match cmd {
            Commands::Categories => xconv::AppCommand::Categories,
            Commands::Units { category } => xconv::AppCommand::Units { category },
            Commands::Convert {
                value,
                from,
                to,
                category,
            } => xconv::AppCommand::Convert {
                value,
                from,
                to,
                category,
            },
            Commands::History { coin, fiat, days } => {
                xconv::AppCommand::History { coin, fiat, days }
            }
            Commands::Shell => xconv::AppCommand::Shell,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List unit categories
    Categories,
    /// List the units of a category
    Units { category: Category },
    /// Convert a value between two units, e.g. `convert 12 in cm`
    Convert {
        #[arg(value_parser = parse_value, allow_hyphen_values = true)]
        value: Decimal,
        from: String,
        to: String,
        /// Restrict unit lookup to one category
        #[arg(long)]
        category: Option<Category>,
    },
    /// Show price history of a coin
    History {
        coin: Coin,
        #[arg(default_value = "USD")]
        fiat: String,
        /// Number of days to look back
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
    },
    /// Start an interactive conversion shell
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => xconv::cli::setup::setup_at_path(path),
            None => xconv::cli::setup::setup(),
        },
        Some(cmd) => {
            xconv::run_command(cmd.into(), cli.config_path.as_deref(), cli.offline).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

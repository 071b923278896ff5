use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use folio::cli::ui::{StyleType, style_text};
use folio::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::Suggest {
                amount,
                strategies,
                json,
            } => folio::AppCommand::Suggest {
                amount,
                strategies,
                json,
            },
            Commands::History { json } => folio::AppCommand::History { json },
            Commands::Strategies => folio::AppCommand::Strategies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Suggest a portfolio for an amount and one or two strategies
    Suggest {
        /// Amount to invest
        #[arg(short, long)]
        amount: f64,

        /// Strategy to follow, by name or key; repeat for a second one
        #[arg(short = 's', long = "strategy", required = true)]
        strategies: Vec<String>,

        /// Print the allocation and history as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display the recent portfolio value trend
    History {
        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available strategies and their tickers
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => folio::cli::setup::setup(),
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
        eprintln!("{}", style_text(&format!("Error: {e:#}"), StyleType::Error));
        std::process::exit(1);
    }
    result
}

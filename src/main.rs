use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ledgerfolio::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Ledger CSV to read instead of the configured one
    #[arg(short, long, global = true)]
    ledger: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ledgerfolio::AppCommand {
    fn from(cmd: Commands) -> ledgerfolio::AppCommand {
        match cmd {
            Commands::Summary => ledgerfolio::AppCommand::Summary,
            Commands::Yearly => ledgerfolio::AppCommand::Yearly,
            Commands::History => ledgerfolio::AppCommand::History,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display holdings, totals, P/L and CAGR
    Summary,
    /// Display per-year valuation, P/L and growth
    Yearly,
    /// Display the weekly valuation history
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ledgerfolio::cli::setup::setup(),
        Some(cmd) => {
            ledgerfolio::run_command(
                cmd.into(),
                cli.config_path.as_deref(),
                cli.ledger.as_deref(),
            )
            .await
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

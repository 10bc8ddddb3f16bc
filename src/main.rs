use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xconv::core::log::init_logging;

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

impl From<Commands> for xconv::AppCommand {
    fn from(cmd: Commands) -> xconv::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                xconv::AppCommand::Convert { amount, from, to }
            }
            Commands::Currencies => xconv::AppCommand::Currencies,
            Commands::Watch => xconv::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        #[arg(allow_hyphen_values = true)]
        amount: Option<String>,
        /// Source currency code, e.g. USD
        from: Option<String>,
        /// Target currency code, e.g. KGS
        to: Option<String>,
    },
    /// List known currencies
    Currencies,
    /// Convert interactively, re-running as the inputs change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xconv::cli::setup::setup(),
        Some(cmd) => xconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
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

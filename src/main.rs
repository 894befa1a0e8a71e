use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use doviz::log::init_logging;

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

impl From<Commands> for doviz::AppCommand {
    fn from(cmd: Commands) -> doviz::AppCommand {
        match cmd {
            Commands::Serve => doviz::AppCommand::Serve,
            Commands::Collect => doviz::AppCommand::Collect,
            Commands::History { pair } => doviz::AppCommand::History { pair },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve,
    /// Fetch rates from all sources once and persist the reading
    Collect,
    /// Show recent rate history
    History {
        /// Currency pair, e.g. USD_TRY
        #[arg(short, long)]
        pair: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(cmd) => doviz::run_command(cmd.into(), cli.config_path.as_deref()).await,
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

use anyhow::Result;
use cambio::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two assets
    Convert {
        /// Asset class: fiat or crypto
        #[arg(short, long, default_value = "fiat")]
        mode: String,
        /// Code of the asset to convert from (e.g. USD, BTC)
        #[arg(short, long)]
        from: String,
        /// Code of the asset to convert to (e.g. EUR, ETH)
        #[arg(short, long)]
        to: String,
        /// Amount to convert; empty counts as 0
        #[arg(short, long, default_value = "")]
        amount: String,
    },
    /// List known asset codes and their USD rates
    List {
        /// Asset class: fiat or crypto
        #[arg(short, long, default_value = "fiat")]
        mode: String,
        /// Case-insensitive substring to filter codes by
        #[arg(long)]
        filter: Option<String>,
    },
}

impl TryFrom<Commands> for cambio::AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<cambio::AppCommand> {
        match cmd {
            Commands::Convert {
                mode,
                from,
                to,
                amount,
            } => Ok(cambio::AppCommand::Convert {
                mode: mode.parse()?,
                from,
                to,
                amount,
            }),
            Commands::List { mode, filter } => Ok(cambio::AppCommand::List {
                mode: mode.parse()?,
                filter,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => cambio::run_command(cmd.try_into()?, cli.config_path.as_deref()).await,
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

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = cambio::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  fiat:
    base_url: "https://v6.exchangerate-api.com"
    # api_key: "..."   # or set EXCHANGE_RATE_API_KEY
  crypto:
    base_url: "https://api.coingecko.com"
    # api_key: "..."   # or set COINGECKO_API_KEY

display:
  amount_decimals: 8
  rate_decimals: 6
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}

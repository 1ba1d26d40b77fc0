use anyhow::Result;
use clap::{Parser, Subcommand};
use flightsurety::NodeConfig;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flightsurety")]
#[command(about = "FlightSurety node: insurance state, simulated oracles and the dapp server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node (state machine, oracle simulator, RPC server)
    Serve {
        /// Configuration file (toml, json or yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the derived local accounts
    Accounts {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short = 'n', long, default_value_t = 40)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = NodeConfig::load(config.as_deref())?;
            info!("Starting FlightSurety node");
            flightsurety::run(config, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for ctrl-c: {}", e);
                }
                info!("Shutdown requested");
            })
            .await?;
        }
        Commands::Config { config } => {
            let config = NodeConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Accounts { config, count } => {
            let config = NodeConfig::load(config.as_deref())?;
            let oracles = config.oracle_accounts()?;
            for i in 0..count {
                let role = if i == config.owner_account {
                    "owner"
                } else if i == config.genesis_airline_account {
                    "genesis airline"
                } else if oracles.contains(&i) {
                    "oracle"
                } else {
                    ""
                };
                println!("{:>3}  {}  {}", i, config.account(i), role);
            }
        }
    }

    Ok(())
}

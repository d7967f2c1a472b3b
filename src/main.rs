use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use servo_duo_runtime::config::RuntimeConfig;
use servo_duo_runtime::control::RngSource;
use servo_duo_runtime::motor::{PwmBridge, SimulatedOutput};
use servo_duo_runtime::runtime;

#[derive(Debug, Parser)]
#[command(author, version, about = "Two-servo controller: UDP angles or potentiometer")]
struct Cli {
    /// TOML config file (all fields optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port of the PWM bridge; without it duties are only logged
    #[arg(long)]
    bridge: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manual animation / automatic angle control over UDP (default)
    Listen {
        /// Override the UDP port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Steer with the potentiometer on the bridge's analog input
    Pot,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = start(Cli::parse()).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn start(cli: Cli) -> Result<(), BoxError> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            RuntimeConfig::load(path)?
        }
        None => RuntimeConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Listen { port: None }) {
        Commands::Listen { port } => {
            if let Some(port) = port {
                config.udp_port = port;
            }
            let source = RngSource::from_os_rng();
            match cli.bridge {
                Some(port) => {
                    info!("Opening PWM bridge on {}", port);
                    runtime::run(config, PwmBridge::open(&port)?, source).await
                }
                None => {
                    warn!("No bridge configured, running with simulated PWM output");
                    runtime::run(config, SimulatedOutput::default(), source).await
                }
            }
        }
        Commands::Pot => match cli.bridge {
            Some(port) => {
                info!("Opening PWM bridge on {}", port);
                runtime::run_pot(config, PwmBridge::open(&port)?).await
            }
            None => Err("pot steering needs --bridge for the analog input".into()),
        },
    }
}

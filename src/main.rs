use std::path::PathBuf;

use clap::{Parser, Subcommand};
use riskguard::app::{App, Collaborators};
use riskguard::config::Config;
use tokio::signal;
use tracing::info;

/// Riskguard - risk control and coordination for the trading backend.
#[derive(Parser, Debug)]
#[command(name = "riskguard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, short, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the services (default)
    Run,
    /// Validate the configuration file and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Missing file falls back to defaults; a present but invalid file is fatal.
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(Commands::CheckConfig) = cli.command {
        println!("configuration ok: {}", cli.config.display());
        return Ok(());
    }

    config.logging.init();
    info!("riskguard starting");

    let app = App::build(&config, Collaborators::in_memory());
    let monitor = app.spawn_monitor();

    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    monitor.abort();
    app.shutdown();
    info!("riskguard stopped");
    Ok(())
}

//! PortSync CLI - Reconcile server configuration ports with Docker port mappings
//!
//! A command-line tool for inspecting declared and mapped ports, reviewing
//! the change-set between them, and applying it after confirmation.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portsync")]
#[command(author, version, about = "Reconcile server configuration ports with Docker port mappings")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Port-manager base URL (overrides the config file)
    #[arg(long, global = true, env = "PORTSYNC_URL")]
    url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the live port mappings
    #[command(alias = "ls")]
    Ports,

    /// List the ports declared in a configuration file
    Extract {
        /// Server configuration XML file
        file: PathBuf,
    },

    /// Show the ports to add and remove for a configuration file
    Diff {
        /// Server configuration XML file
        file: PathBuf,
    },

    /// Apply the port changes for a configuration file
    Apply {
        /// Server configuration XML file
        file: PathBuf,

        /// Apply without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Watch a configuration file and report port changes as it is edited
    Watch {
        /// Server configuration XML file
        file: PathBuf,

        /// How often to poll the file, in milliseconds
        #[arg(long, default_value = "500")]
        interval: u64,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the port-manager base URL
    SetUrl { url: String },
    /// Set the debounce window for background re-checks
    SetDebounce { millis: u64 },
    /// Set the request timeout (0 clears it)
    SetTimeout { secs: u64 },
    /// Enable or disable memoized checks
    SetMemoize {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let url = cli.url.as_deref();

    match cli.command {
        Commands::Ports => commands::ports::run(url, cli.json).await?,
        Commands::Extract { file } => commands::extract::run(&file, cli.json).await?,
        Commands::Diff { file } => commands::diff::run(&file, url, cli.json).await?,
        Commands::Apply { file, yes } => commands::apply::run(&file, url, yes, cli.json).await?,
        Commands::Watch { file, interval } => {
            commands::watch::run(&file, url, interval, cli.json).await?
        }
        Commands::Config { action } => match action {
            None => commands::config::show(cli.json).await?,
            Some(ConfigAction::SetUrl { url }) => commands::config::set_url(&url).await?,
            Some(ConfigAction::SetDebounce { millis }) => {
                commands::config::set_debounce(millis).await?
            }
            Some(ConfigAction::SetTimeout { secs }) => commands::config::set_timeout(secs).await?,
            Some(ConfigAction::SetMemoize { enabled }) => {
                commands::config::set_memoize(enabled).await?
            }
        },
    }

    Ok(())
}

mod cmd;
mod config_path;
mod notify;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "freqsync",
    about = "Keep a trading strategy and its config files in sync with a remote repository",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest freqsync.yaml in this or a parent directory)
    #[arg(long, global = true, env = "FREQSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Validate or print the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List the files that would be tracked this cycle
    Catalog,

    /// Run a single update cycle
    Check {
        /// Compare only; download nothing and never restart
        #[arg(long)]
        dry_run: bool,
    },

    /// Check on a fixed interval until interrupted
    Run,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Run | Commands::Check { .. } => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let explicit = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => {
            cmd::init::run(&config_path::init_target(explicit), force, cli.json)
        }
        Commands::Config { subcommand } => {
            cmd::config::run(&config_path::resolve_config_path(explicit), subcommand, cli.json)
        }
        Commands::Catalog => cmd::catalog::run(&config_path::resolve_config_path(explicit), cli.json),
        Commands::Check { dry_run } => {
            cmd::check::run(&config_path::resolve_config_path(explicit), dry_run, cli.json)
        }
        Commands::Run => cmd::run::run(&config_path::resolve_config_path(explicit)),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

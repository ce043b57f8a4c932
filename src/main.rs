//! Binary entrypoint for wisharify.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, error};
use wisharify::app::{self, Command, Store};
use wisharify::config::Config;
use wisharify::logging;

#[derive(Debug, Parser)]
#[command(
    name = "wisharify",
    version,
    about = "Show a QR code that lets phones join the current Wi-Fi network."
)]
struct Cli {
    /// Path to YAML config file (defaults to ~/.config/wisharify/config.yaml).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Do not read or write the desktop keyring.
    #[arg(long, global = true)]
    no_keyring: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    if let Err(err) = try_main() {
        error!(error = ?err, "wisharify exited with error");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default().context("loading default config")?,
    };

    let command = cli.command.unwrap_or(Command::Show);
    debug!(?command, no_keyring = cli.no_keyring, "starting wisharify");

    let store = Store::new(!cli.no_keyring);
    app::run(command, &config, &store)?;
    Ok(())
}

use anyhow::{Context, Result};
use avatar_app::commands::{self, bringup::BringupArgs, ProfileArgs, SessionContext};
use avatar_app::config::AppConfig;
use avatar_app::logging;
use avatar_config::SessionSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avatar-session", version, about = "Avatar profile resolution and runtime bring-up")]
struct Cli {
    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML config file (default: ./avatar.yaml if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List catalog profiles with their buffer characteristics
    Profiles,
    /// Print the resolved profile as YAML
    Resolve(ProfileArgs),
    /// Print the engine environment for the resolved profile
    Env(ProfileArgs),
    /// Show host capacity and the adaptive tier
    Probe,
    /// Bring up a runtime, report the outcome, then shut it down
    Bringup(BringupArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;
    let settings = SessionSettings::from_env().context("Invalid session environment")?;
    let ctx = SessionContext::new(config, settings);

    match &cli.command {
        Command::Profiles => commands::profiles::run(),
        Command::Resolve(args) => commands::resolve::run(&ctx, args),
        Command::Env(args) => commands::resolve::run_env(&ctx, args),
        Command::Probe => commands::probe::run(),
        Command::Bringup(args) => commands::bringup::run(&ctx, args).await,
    }
}

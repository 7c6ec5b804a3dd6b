use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pmswitch_core::preference::PackageManager;
use pmswitch_infrastructure::{ConfigService, PmsPaths};

mod bootstrap;
mod commands;
mod logging;
mod render;

use bootstrap::{AppBootstrap, HostMode};

#[derive(Parser)]
#[command(name = "pmswitch")]
#[command(version, about = "Package manager switcher - preferences and self-update", long_about = None)]
struct Cli {
    /// Keep config and data under this directory instead of the platform defaults
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Print snapshots as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current preferences and update state
    Status,
    /// Set the preferred package manager
    Use {
        #[arg(value_parser = parse_package_manager)]
        package_manager: PackageManager,
    },
    /// Turn the background monitor on or off
    Monitor { state: Toggle },
    /// Check for a new version and optionally install it
    Update {
        /// Install without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Keep a session open, reading intents from stdin
    Run,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn parse_package_manager(raw: &str) -> Result<PackageManager, String> {
    raw.parse()
        .map_err(|_| format!("unknown package manager '{}' (npm, pnpm, yarn, bun)", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = PmsPaths::new(cli.home.clone());
    let config = ConfigService::new(&paths)?.get_config();
    let _log_guard = logging::init_tracing(&config, &paths, cli.verbose);

    let mode = match cli.command {
        Commands::Run => HostMode::Interactive,
        _ => HostMode::OneShot,
    };
    let app = AppBootstrap::build(&paths, &config, mode)?;

    match cli.command {
        Commands::Status => commands::status::run(&app, cli.json).await?,
        Commands::Use { package_manager } => {
            commands::preference::use_package_manager(&app, package_manager, cli.json).await?
        }
        Commands::Monitor { state } => {
            commands::preference::set_monitoring(&app, matches!(state, Toggle::On), cli.json)
                .await?
        }
        Commands::Update { yes } => commands::update::run(&app, yes).await?,
        Commands::Run => commands::run::run(&app).await?,
    }

    Ok(())
}

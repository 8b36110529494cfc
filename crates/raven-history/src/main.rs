mod daemon;
mod ipc;

use clap::{Parser, Subcommand};
use tracing::info;

use raven_history_core::{ControlCommand, Direction};

#[derive(Parser)]
#[command(name = "raven-history")]
#[command(about = "Back/forward window navigation for Hyprland")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run as daemon (default)
    Daemon,
    /// Focus the previously focused window
    Back,
    /// Undo the last `back`
    Forward,
    /// Show the history ledger
    Status,
    /// Forget all history
    Clear,
    /// Reload configuration
    ReloadConfig,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("raven_history=info".parse()?)
                .add_directive("raven_history_core=info".parse()?)
                .add_directive("hyprland=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Some(Command::Daemon) | None => {
            info!("Starting Raven history daemon");
            return daemon::run();
        }
        Some(Command::Back) => ControlCommand::Traverse(Direction::Back),
        Some(Command::Forward) => ControlCommand::Traverse(Direction::Forward),
        Some(Command::Status) => ControlCommand::Status,
        Some(Command::Clear) => ControlCommand::Clear,
        Some(Command::ReloadConfig) => ControlCommand::ReloadConfig,
    };

    ipc::send(command)
}

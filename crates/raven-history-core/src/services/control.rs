use async_channel::Sender;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::{HistoryCoordinator, HistorySnapshot, PaneHost};
use crate::config::HistoryConfig;
use crate::messages::{ControlCommand, HistoryEvent};

/// Line-based control socket: one command per connection, one reply
pub struct ControlServer<H> {
    socket_path: PathBuf,
    config_path: PathBuf,
    coordinator: HistoryCoordinator<H>,
    event_tx: Sender<HistoryEvent>,
}

impl<H: PaneHost> ControlServer<H> {
    pub fn new(
        socket_path: PathBuf,
        config_path: PathBuf,
        coordinator: HistoryCoordinator<H>,
        event_tx: Sender<HistoryEvent>,
    ) -> Self {
        Self {
            socket_path,
            config_path,
            coordinator,
            event_tx,
        }
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> anyhow::Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("Control socket listening on: {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let coordinator = self.coordinator.clone();
                    let event_tx = self.event_tx.clone();
                    let config_path = self.config_path.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_client(stream, coordinator, event_tx, config_path).await
                        {
                            warn!("Control client error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting control connection: {}", e);
                }
            }
        }
    }
}

async fn handle_client<H: PaneHost>(
    stream: UnixStream,
    coordinator: HistoryCoordinator<H>,
    event_tx: Sender<HistoryEvent>,
    config_path: PathBuf,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;

    let reply = match ControlCommand::from_str(&line) {
        Some(command) => {
            debug!("Control command: {}", command.as_str());
            execute(command, &coordinator, &event_tx, &config_path).await
        }
        None => "error: unknown command".to_string(),
    };

    writer.write_all(reply.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.shutdown().await?;
    Ok(())
}

async fn execute<H: PaneHost>(
    command: ControlCommand,
    coordinator: &HistoryCoordinator<H>,
    event_tx: &Sender<HistoryEvent>,
    config_path: &Path,
) -> String {
    match command {
        // Traversals go through the event queue so they stay ordered with host events
        ControlCommand::Traverse(direction) => {
            match event_tx.send(HistoryEvent::Command(direction)).await {
                Ok(()) => "ok".to_string(),
                Err(_) => "error: coordinator stopped".to_string(),
            }
        }
        ControlCommand::Status => render_status(&coordinator.snapshot()),
        ControlCommand::Clear => {
            coordinator.clear();
            "ok".to_string()
        }
        ControlCommand::ReloadConfig => {
            let config = HistoryConfig::load(config_path);
            match event_tx.send(HistoryEvent::ConfigReloaded(config)).await {
                Ok(()) => "ok".to_string(),
                Err(_) => "error: coordinator stopped".to_string(),
            }
        }
    }
}

/// Human-readable dump of the ledger, present entry marked with `*`
pub fn render_status(snapshot: &HistorySnapshot) -> String {
    let ledger = &snapshot.ledger;
    let mut out = String::new();

    let present = ledger
        .present()
        .map(|key| key.to_string())
        .unwrap_or_else(|| "none".to_string());
    let _ = writeln!(out, "present: {}", present);
    let _ = writeln!(out, "traversing: {}", snapshot.traversing);
    let _ = writeln!(
        out,
        "rendezvous: {}",
        if snapshot.gate_armed { "waiting" } else { "idle" }
    );
    let _ = write!(out, "entries: {}", ledger.len());

    for entry in ledger.entries() {
        let marker = if entry.is_present() { '*' } else { ' ' };
        let _ = write!(out, "\n{} {:>4} {}", marker, entry.offset, entry.key);
    }

    out
}

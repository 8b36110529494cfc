use ahash::AHashMap;
use async_channel::Sender;
use hyprland::data::{Client, Clients, Workspaces};
use hyprland::dispatch::{Dispatch, DispatchType, WindowIdentifier};
use hyprland::event_listener::EventListener;
use hyprland::shared::{Address, HyprData, HyprDataActiveOptional};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::PaneHost;
use crate::error::HostError;
use crate::messages::HistoryEvent;
use crate::state::PaneKey;

/// Raw window signal from the Hyprland event socket, before the window is
/// resolved to a full key
#[derive(Debug, Clone)]
enum WindowSignal {
    Opened { pane_id: u64, workspace: Option<i64> },
    Focused(u64),
    Closed(u64),
    Moved { pane_id: u64, workspace: Option<i64> },
}

/// Every workspace a window has been seen on, most recent last.
///
/// History keys carry the workspace the window was on when it was visited,
/// so a window that moved can appear in the ledger under several keys.
#[derive(Debug, Default)]
struct PaneTable {
    panes: AHashMap<u64, SmallVec<[i64; 2]>>,
}

impl PaneTable {
    fn record(&mut self, pane_id: u64, container_id: i64) {
        let seen = self.panes.entry(pane_id).or_default();
        if seen.last() == Some(&container_id) {
            return;
        }
        seen.retain(|id| *id != container_id);
        seen.push(container_id);
    }

    fn current(&self, pane_id: u64) -> Option<i64> {
        self.panes.get(&pane_id)?.last().copied()
    }

    fn contains(&self, pane_id: u64) -> bool {
        self.panes.contains_key(&pane_id)
    }

    /// Drop a window, returning every workspace it was recorded under
    fn forget(&mut self, pane_id: u64) -> SmallVec<[i64; 2]> {
        self.panes.remove(&pane_id).unwrap_or_default()
    }

    fn retain(&mut self, mut live: impl FnMut(u64) -> bool) {
        self.panes.retain(|pane_id, _| live(*pane_id));
    }

    fn len(&self) -> usize {
        self.panes.len()
    }
}

/// Pane host backed by Hyprland IPC: windows are panes, workspaces are
/// containers.
#[derive(Clone, Default)]
pub struct HyprlandHost {
    panes: Arc<Mutex<PaneTable>>,
}

impl HyprlandHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if Hyprland is running by looking for its socket
    fn is_hyprland_running() -> bool {
        if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
            if let Ok(sig) = std::env::var("HYPRLAND_INSTANCE_SIGNATURE") {
                let socket_path = format!("{}/hypr/{}/.socket.sock", runtime_dir, sig);
                return std::path::Path::new(&socket_path).exists();
            }
        }
        false
    }

    /// Main run loop - waits for Hyprland, syncs windows, then forwards
    /// focus and close events until the receiver goes away
    pub async fn run(self, event_tx: Sender<HistoryEvent>) -> anyhow::Result<()> {
        info!("Starting Hyprland pane host");

        let (signal_tx, signal_rx) = async_channel::bounded::<WindowSignal>(64);
        let translator = tokio::spawn(self.clone().translate(signal_rx, event_tx.clone()));

        loop {
            if !Self::is_hyprland_running() {
                warn!("Hyprland not running, waiting...");
            } else if let Err(e) = self.sync_clients().await {
                warn!("Failed to sync Hyprland clients: {}, retrying in 2s", e);
            } else {
                if event_tx.send(HistoryEvent::HostConnected).await.is_err() {
                    break;
                }
                if let Err(e) = Self::run_event_listener(signal_tx.clone()).await {
                    error!("Event listener error: {}, reconnecting...", e);
                }
                if event_tx.send(HistoryEvent::HostDisconnected).await.is_err() {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }

        translator.abort();
        Ok(())
    }

    /// Bring the window table in line with the client list. Windows that
    /// are gone are dropped; live ones keep their earlier workspaces.
    async fn sync_clients(&self) -> anyhow::Result<()> {
        let clients = Clients::get_async().await?;
        let live: AHashMap<u64, i64> = clients
            .into_iter()
            .filter_map(|client| {
                let pane_id = PaneKey::parse_address(&client.address.to_string())?;
                Some((pane_id, client.workspace.id as i64))
            })
            .collect();

        let mut panes = self.panes.lock();
        panes.retain(|pane_id| live.contains_key(&pane_id));
        for (&pane_id, &container_id) in &live {
            panes.record(pane_id, container_id);
        }
        debug!("Synced {} Hyprland windows", panes.len());

        Ok(())
    }

    /// Run the event listener (blocks until error)
    async fn run_event_listener(tx: Sender<WindowSignal>) -> anyhow::Result<()> {
        let mut listener = EventListener::new();

        // Window opened
        let tx0 = tx.clone();
        listener.add_window_open_handler(move |data| {
            if let Some(pane_id) = PaneKey::parse_address(&data.window_address.to_string()) {
                let _ = tx0.send_blocking(WindowSignal::Opened {
                    pane_id,
                    workspace: data.workspace_name.parse::<i64>().ok(),
                });
            }
        });

        // Active window changed (focus)
        let tx1 = tx.clone();
        listener.add_active_window_change_handler(move |data| {
            if let Some(data) = data {
                if let Some(pane_id) = PaneKey::parse_address(&data.window_address.to_string()) {
                    let _ = tx1.send_blocking(WindowSignal::Focused(pane_id));
                }
            }
        });

        // Window closed
        let tx2 = tx.clone();
        listener.add_window_close_handler(move |addr| {
            if let Some(pane_id) = PaneKey::parse_address(&addr.to_string()) {
                let _ = tx2.send_blocking(WindowSignal::Closed(pane_id));
            }
        });

        // Window moved to another workspace; named workspaces resolve on next focus
        let tx3 = tx.clone();
        listener.add_window_moved_handler(move |data| {
            if let Some(pane_id) = PaneKey::parse_address(&data.window_address.to_string()) {
                let _ = tx3.send_blocking(WindowSignal::Moved {
                    pane_id,
                    workspace: data.workspace_name.parse::<i64>().ok(),
                });
            }
        });

        debug!("Starting Hyprland event listener");
        listener.start_listener_async().await?;

        Ok(())
    }

    /// Resolve raw signals to pane keys, in arrival order
    async fn translate(
        self,
        signals: async_channel::Receiver<WindowSignal>,
        event_tx: Sender<HistoryEvent>,
    ) {
        while let Ok(signal) = signals.recv().await {
            let events: SmallVec<[HistoryEvent; 2]> = match signal {
                WindowSignal::Opened { pane_id, workspace }
                | WindowSignal::Moved { pane_id, workspace } => {
                    if let Some(container_id) = workspace {
                        self.panes.lock().record(pane_id, container_id);
                    }
                    continue;
                }
                WindowSignal::Focused(pane_id) => match self.resolve_focused(pane_id).await {
                    Some(key) => smallvec::smallvec![HistoryEvent::Activated(key)],
                    None => {
                        debug!("Focused window 0x{:x} has no known workspace", pane_id);
                        continue;
                    }
                },
                // One removal per workspace the window was recorded under
                WindowSignal::Closed(pane_id) => {
                    let seen = self.panes.lock().forget(pane_id);
                    seen.into_iter()
                        .map(|container_id| {
                            HistoryEvent::Removed(PaneKey::new(pane_id, container_id))
                        })
                        .collect()
                }
            };

            for event in events {
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
        }
    }

    /// The focus event carries only the address; ask for the active client to
    /// learn its workspace, falling back to the table if focus already moved on
    async fn resolve_focused(&self, pane_id: u64) -> Option<PaneKey> {
        if let Ok(Some(key)) = self.active_client().await {
            if key.pane_id == pane_id {
                return Some(key);
            }
        }
        let container_id = self.panes.lock().current(pane_id)?;
        Some(PaneKey::new(pane_id, container_id))
    }

    async fn active_client(&self) -> Result<Option<PaneKey>, HostError> {
        if !Self::is_hyprland_running() {
            return Err(HostError::Ipc("Hyprland is not running".to_string()));
        }

        let client = Client::get_active_async()
            .await
            .map_err(|e| HostError::Ipc(e.to_string()))?;

        let Some(client) = client else {
            return Ok(None);
        };
        let Some(pane_id) = PaneKey::parse_address(&client.address.to_string()) else {
            return Ok(None);
        };

        let key = PaneKey::new(pane_id, client.workspace.id as i64);
        self.panes.lock().record(key.pane_id, key.container_id);
        Ok(Some(key))
    }
}

impl PaneHost for HyprlandHost {
    async fn query_current_pane(&self) -> Result<Option<PaneKey>, HostError> {
        self.active_client().await
    }

    /// `focuswindow` already switches to the window's workspace, and a separate
    /// `workspace` dispatch would focus whatever window was last active there.
    /// Only confirm the workspace still exists.
    async fn focus_container(&self, container_id: i64) -> Result<(), HostError> {
        let workspaces = Workspaces::get_async()
            .await
            .map_err(|e| HostError::Ipc(e.to_string()))?;

        if workspaces.into_iter().any(|ws| ws.id as i64 == container_id) {
            Ok(())
        } else {
            Err(HostError::Gone(format!("workspace {}", container_id)))
        }
    }

    async fn activate_pane(&self, pane_id: u64) -> Result<(), HostError> {
        let address = format!("0x{:x}", pane_id);
        let known = self.panes.lock().contains(pane_id);
        if !known {
            return Err(HostError::Gone(format!("window {}", address)));
        }

        debug!("Focusing window: {}", address);
        Dispatch::call_async(DispatchType::FocusWindow(WindowIdentifier::Address(
            Address::new(&address),
        )))
        .await
        .map_err(|e| HostError::Ipc(e.to_string()))
    }
}

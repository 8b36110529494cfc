use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{ConfigWatcher, ControlServer, HistoryCoordinator, HyprlandHost, Persister};
use crate::config::{ConfigPaths, HistoryConfig};
use crate::messages::HistoryEvent;
use crate::store::{JsonFileStore, LedgerStore, MemoryStore};

/// Central hub wiring the Hyprland host, coordinator, persister, config
/// watcher and control socket together
pub struct ServiceHub {
    /// Event sender for host, control and config events
    event_tx: async_channel::Sender<HistoryEvent>,
    coordinator: HistoryCoordinator<HyprlandHost>,
    store: Arc<dyn LedgerStore>,
    paths: ConfigPaths,
    tasks: Vec<JoinHandle<()>>,
}

impl ServiceHub {
    /// Start every service on the current tokio runtime
    pub async fn start(paths: ConfigPaths) -> anyhow::Result<Self> {
        let config = HistoryConfig::load(&paths.config);

        let store: Arc<dyn LedgerStore> = if config.persist {
            let state_file = paths.state_file(&config);
            info!("Persisting history to {:?}", state_file);
            Arc::new(JsonFileStore::new(state_file))
        } else {
            Arc::new(MemoryStore::new())
        };

        let (event_tx, event_rx) = async_channel::bounded::<HistoryEvent>(64);
        let host = HyprlandHost::new();
        let coordinator = HistoryCoordinator::bootstrap(host.clone(), store.as_ref(), config).await;

        let mut tasks = Vec::new();

        let event_tx_host = event_tx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = host.run(event_tx_host).await {
                error!("Hyprland host error: {}", e);
            }
        }));

        tasks.push(tokio::spawn(coordinator.clone().run(event_rx)));

        tasks.push(tokio::spawn(
            Persister::new(store.clone(), coordinator.subscribe()).run(),
        ));

        let watcher = ConfigWatcher::new(paths.clone(), event_tx.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(e) = watcher.run().await {
                error!("Config watcher error: {}", e);
            }
        }));

        let control = ControlServer::new(
            paths.socket.clone(),
            paths.config.clone(),
            coordinator.clone(),
            event_tx.clone(),
        );
        tasks.push(tokio::spawn(async move {
            if let Err(e) = control.run().await {
                error!("Control socket error: {}", e);
            }
        }));

        info!("ServiceHub initialized with all services");

        Ok(Self {
            event_tx,
            coordinator,
            store,
            paths,
            tasks,
        })
    }

    pub fn coordinator(&self) -> &HistoryCoordinator<HyprlandHost> {
        &self.coordinator
    }

    /// Stop every service, write the final ledger and remove the socket
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        self.event_tx.close();

        if let Err(e) = self.store.save(&self.coordinator.ledger()) {
            warn!("Failed to save history on shutdown: {}", e);
        }
        let _ = std::fs::remove_file(&self.paths.socket);

        info!("ServiceHub stopped");
    }
}

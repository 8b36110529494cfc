use async_channel::Sender;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{ConfigPaths, HistoryConfig};
use crate::messages::HistoryEvent;

/// Service that watches history.json for changes using inotify
pub struct ConfigWatcher {
    paths: ConfigPaths,
    event_tx: Sender<HistoryEvent>,
}

impl ConfigWatcher {
    pub fn new(paths: ConfigPaths, event_tx: Sender<HistoryEvent>) -> Self {
        Self { paths, event_tx }
    }

    /// Run the config watcher (blocks forever)
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting config watcher");

        let config_dir = self.paths.config_dir();
        let _ = tokio::fs::create_dir_all(&config_dir).await;

        let (notify_tx, mut notify_rx) = mpsc::channel::<std::path::PathBuf>(32);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    // Only react to modifications and creations
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            let _ = notify_tx.blocking_send(path);
                        }
                    }
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        // Watch the directory since the file might not exist yet
        if config_dir.exists() {
            watcher.watch(&config_dir, RecursiveMode::NonRecursive)?;
            debug!("Watching directory: {:?}", config_dir);
        }

        // Debounce timer - wait for rapid changes to settle
        let mut debounce_deadline: Option<tokio::time::Instant> = None;

        loop {
            tokio::select! {
                Some(path) = notify_rx.recv() => {
                    if path == self.paths.config {
                        debounce_deadline = Some(tokio::time::Instant::now() + Duration::from_millis(100));
                    }
                }

                _ = async {
                    match debounce_deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    debounce_deadline = None;
                    if !self.reload().await {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Reload history.json and send it to the coordinator; false once the
    /// coordinator is gone
    async fn reload(&self) -> bool {
        debug!("Reloading history config: {:?}", self.paths.config);

        match tokio::fs::read(&self.paths.config).await {
            Ok(data) => match serde_json::from_slice::<HistoryConfig>(&data) {
                Ok(config) => {
                    info!("History config reloaded");
                    return self
                        .event_tx
                        .send(HistoryEvent::ConfigReloaded(config))
                        .await
                        .is_ok();
                }
                Err(e) => warn!("Failed to parse history config: {}", e),
            },
            Err(e) => debug!("Could not read history config: {}", e),
        }
        true
    }
}

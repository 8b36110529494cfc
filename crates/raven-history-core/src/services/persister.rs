use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::state::HistoryLedger;
use crate::store::LedgerStore;

/// Writes ledger snapshots to a store. Snapshots published faster than the
/// store can write collapse into the latest one.
pub struct Persister {
    store: Arc<dyn LedgerStore>,
    snapshots: watch::Receiver<HistoryLedger>,
}

impl Persister {
    pub fn new(store: Arc<dyn LedgerStore>, snapshots: watch::Receiver<HistoryLedger>) -> Self {
        Self { store, snapshots }
    }

    /// Run until the coordinator is dropped
    pub async fn run(mut self) {
        info!("Starting history persister");

        while self.snapshots.changed().await.is_ok() {
            let ledger = self.snapshots.borrow_and_update().clone();
            let store = self.store.clone();

            let saved = tokio::task::spawn_blocking(move || store.save(&ledger)).await;
            match saved {
                Ok(Ok(())) => debug!("History snapshot saved"),
                Ok(Err(e)) => warn!("Failed to save history: {}", e),
                Err(e) => warn!("History save task failed: {}", e),
            }
        }

        debug!("Snapshot channel closed, persister stopping");
    }
}

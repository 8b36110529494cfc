use tokio::runtime::Runtime;
use tracing::info;

use raven_history_core::{ConfigPaths, ServiceHub};

/// Run the history daemon until interrupted
pub fn run() -> anyhow::Result<()> {
    info!("Initializing Raven history daemon");

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        let paths = ConfigPaths::new();
        let hub = ServiceHub::start(paths).await?;

        tokio::signal::ctrl_c().await?;
        info!(
            "Interrupted, shutting down with {} history entries",
            hub.coordinator().ledger().len()
        );

        hub.shutdown();
        Ok::<(), anyhow::Error>(())
    })
}

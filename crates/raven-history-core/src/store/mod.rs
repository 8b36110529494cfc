//! Load/save boundary for the ledger.
//!
//! Only deployments where the daemon can be torn down between events need a
//! durable store; everything else runs on [`MemoryStore`].

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::state::HistoryLedger;

pub trait LedgerStore: Send + Sync {
    /// Stored ledger, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<HistoryLedger>, StoreError>;

    /// Replace the stored ledger. Saving the same ledger twice is harmless.
    fn save(&self, ledger: &HistoryLedger) -> Result<(), StoreError>;
}

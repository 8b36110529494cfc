use parking_lot::Mutex;

use super::LedgerStore;
use crate::error::StoreError;
use crate::state::HistoryLedger;

/// Non-durable store
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Option<HistoryLedger>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: HistoryLedger) -> Self {
        Self {
            ledger: Mutex::new(Some(ledger)),
            saves: Mutex::new(0),
        }
    }

    /// Number of saves seen so far
    pub fn saves(&self) -> usize {
        *self.saves.lock()
    }

    pub fn snapshot(&self) -> Option<HistoryLedger> {
        self.ledger.lock().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<HistoryLedger>, StoreError> {
        Ok(self.ledger.lock().clone())
    }

    fn save(&self, ledger: &HistoryLedger) -> Result<(), StoreError> {
        *self.ledger.lock() = Some(ledger.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}

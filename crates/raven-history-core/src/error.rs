use std::time::Duration;
use thiserror::Error;

use crate::state::PaneKey;

/// Invariant violations found when validating a ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("offset at index {index} does not increase")]
    Unsorted { index: usize },

    #[error("no present entry among {len} entries")]
    NoPresent { len: usize },

    #[error("entry {index} repeats {key} from its neighbour")]
    AdjacentDuplicate { index: usize, key: PaneKey },
}

/// Failures reported by a pane host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The pane or container vanished between lookup and actuation
    #[error("{0} no longer exists")]
    Gone(String),

    #[error("host IPC failed: {0}")]
    Ipc(String),
}

/// Failures of the persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported state file version {0}")]
    UnsupportedVersion(u32),

    #[error("stored ledger is inconsistent: {0}")]
    Invalid(#[from] LedgerError),
}

/// Non-fatal failures surfaced by the coordinator
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no replacement activation for {key} within {waited:?}, history cleared")]
    RendezvousTimeout { key: PaneKey, waited: Duration },

    #[error("could not focus {key}: {source}")]
    Actuation {
        key: PaneKey,
        #[source]
        source: HostError,
    },
}

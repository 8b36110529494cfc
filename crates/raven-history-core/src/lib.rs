pub mod config;
pub mod error;
pub mod messages;
pub mod services;
pub mod state;
pub mod store;

pub use config::{ConfigPaths, HistoryConfig};
pub use error::{HistoryError, HostError, LedgerError, StoreError};
pub use messages::{ControlCommand, Direction, HistoryEvent};
pub use services::{
    HistoryCoordinator, HistorySnapshot, HyprlandHost, PaneHost, Persister, ServiceHub,
};
pub use state::{HistoryEntry, HistoryLedger, PaneKey, RendezvousGate};
pub use store::{JsonFileStore, LedgerStore, MemoryStore};

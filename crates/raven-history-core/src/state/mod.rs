mod entry;
mod gate;
mod ledger;

pub use entry::{HistoryEntry, PaneKey};
pub use gate::RendezvousGate;
pub use ledger::HistoryLedger;

mod commands;
mod events;

pub use commands::{ControlCommand, Direction};
pub use events::HistoryEvent;

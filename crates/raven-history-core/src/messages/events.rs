use super::Direction;
use crate::config::HistoryConfig;
use crate::state::PaneKey;

/// Events FROM the host, control socket and config watcher TO the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    // =========== Pane Host Events ===========

    /// A pane gained focus
    Activated(PaneKey),

    /// A pane was destroyed
    Removed(PaneKey),

    /// Connected (or reconnected) to the host IPC
    HostConnected,

    /// Lost connection to the host IPC
    HostDisconnected,

    // =========== Command Events ===========

    /// Step through history
    Command(Direction),

    // =========== Configuration Events ===========

    /// history.json was reloaded
    ConfigReloaded(HistoryConfig),
}

use std::future::Future;

use crate::error::HostError;
use crate::state::PaneKey;

/// The window host history is recorded against.
///
/// Events flow in through [`crate::HistoryEvent`]; this trait is the
/// actuation side used when stepping through history.
pub trait PaneHost: Send + Sync + 'static {
    /// Currently focused pane, if the host has one
    fn query_current_pane(&self) -> impl Future<Output = Result<Option<PaneKey>, HostError>> + Send;

    /// Bring a container into view
    fn focus_container(&self, container_id: i64) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Give a pane keyboard focus
    fn activate_pane(&self, pane_id: u64) -> impl Future<Output = Result<(), HostError>> + Send;
}

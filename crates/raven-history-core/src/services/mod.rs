mod config_watcher;
mod control;
mod coordinator;
mod host;
mod hub;
mod hyprland;
mod persister;

pub use config_watcher::ConfigWatcher;
pub use control::{render_status, ControlServer};
pub use coordinator::{HistoryCoordinator, HistorySnapshot};
pub use host::PaneHost;
pub use hub::ServiceHub;
pub use hyprland::HyprlandHost;
pub use persister::Persister;

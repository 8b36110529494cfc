use std::path::PathBuf;

use super::HistoryConfig;

/// File locations used by the history daemon
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config: PathBuf,
    pub state: PathBuf,
    pub socket: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from(".local/state"));
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());

        Self {
            config: config_dir.join("raven/history.json"),
            state: state_dir.join("raven/history-state.json"),
            socket: PathBuf::from(runtime_dir).join("raven-history.sock"),
        }
    }

    /// State file, honouring the override in history.json
    pub fn state_file(&self, config: &HistoryConfig) -> PathBuf {
        config.state_path.clone().unwrap_or_else(|| self.state.clone())
    }

    /// Directory holding history.json
    pub fn config_dir(&self) -> PathBuf {
        self.config.parent().unwrap_or(&PathBuf::from(".")).to_path_buf()
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// History daemon settings (history.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// How long a removal of the focused window waits for the replacement focus
    #[serde(default = "default_rendezvous_timeout_ms")]
    pub rendezvous_timeout_ms: u64,

    /// Ledger length cap, 0 = unbounded
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Write ledger snapshots to the state file
    #[serde(default = "default_persist")]
    pub persist: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

fn default_rendezvous_timeout_ms() -> u64 {
    2000
}

fn default_max_entries() -> usize {
    256
}

fn default_persist() -> bool {
    true
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            rendezvous_timeout_ms: default_rendezvous_timeout_ms(),
            max_entries: default_max_entries(),
            persist: default_persist(),
            state_path: None,
        }
    }
}

impl HistoryConfig {
    pub fn load(path: &Path) -> Self {
        std::fs::read(path)
            .ok()
            .and_then(|data| serde_json::from_slice(&data).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let dir = path.parent().ok_or_else(|| anyhow::anyhow!("Invalid path"))?;
        std::fs::create_dir_all(dir)?;
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn rendezvous_timeout(&self) -> Duration {
        Duration::from_millis(self.rendezvous_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: HistoryConfig = serde_json::from_str(r#"{ "max_entries": 10 }"#).unwrap();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.rendezvous_timeout(), Duration::from_secs(2));
        assert!(config.persist);
        assert_eq!(config.state_path, None);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        assert_eq!(HistoryConfig::load(&path), HistoryConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(HistoryConfig::load(&path), HistoryConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raven/history.json");
        let config = HistoryConfig {
            rendezvous_timeout_ms: 500,
            max_entries: 0,
            persist: false,
            state_path: Some(dir.path().join("state.json")),
        };
        config.save(&path).unwrap();
        assert_eq!(HistoryConfig::load(&path), config);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::LedgerStore;
use crate::error::StoreError;
use crate::state::{HistoryEntry, HistoryLedger};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

/// Ledger persisted as a JSON document, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<HistoryLedger>, StoreError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: StateDocument = serde_json::from_slice(&data)?;
        if document.version != STATE_VERSION {
            return Err(StoreError::UnsupportedVersion(document.version));
        }

        let ledger = HistoryLedger::from_entries(document.entries)?;
        debug!("Loaded {} history entries from {:?}", ledger.len(), self.path);
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &HistoryLedger) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let document = StateDocument {
            version: STATE_VERSION,
            saved_at: Some(Utc::now()),
            entries: ledger.entries().to_vec(),
        };
        let data = serde_json::to_vec_pretty(&document)?;

        // Write beside the target and rename so readers never see a partial ledger
        let temp = self.temp_path();
        std::fs::write(&temp, data)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::state::PaneKey;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("history-state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_ledger_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("raven/history-state.json"));

        let mut ledger = HistoryLedger::new();
        for pane in 1..=4 {
            ledger.record_visit(PaneKey::new(pane, 1));
        }
        store.save(&ledger).unwrap();
        store.save(&ledger).unwrap();

        assert_eq!(store.load().unwrap(), Some(ledger));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history-state.json");
        std::fs::write(&path, r#"{ "version": 9, "entries": [] }"#).unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(9)));
    }

    #[test]
    fn rejects_ledger_without_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history-state.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "entries": [
                    { "key": { "pane_id": 1, "container_id": 1 }, "offset": -2 },
                    { "key": { "pane_id": 2, "container_id": 1 }, "offset": -1 }
                ]
            }"#,
        )
        .unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid(LedgerError::NoPresent { len: 2 })
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history-state.json");
        std::fs::write(&path, "history").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(StoreError::Json(_))
        ));
    }
}

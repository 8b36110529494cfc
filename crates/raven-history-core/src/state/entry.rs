use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a pane (a client window) inside its container (a workspace).
///
/// Both ids are assigned by the host; equality is structural, so a window that
/// moves to another workspace is a different key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneKey {
    pub pane_id: u64,
    pub container_id: i64,
}

impl PaneKey {
    pub fn new(pane_id: u64, container_id: i64) -> Self {
        Self {
            pane_id,
            container_id,
        }
    }

    /// Parse a Hyprland window address ("0x55d1c0a3b2e0" or "55d1c0a3b2e0")
    pub fn parse_address(address: &str) -> Option<u64> {
        let hex = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .unwrap_or(address);
        if hex.is_empty() {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()
    }

    /// Window address in the form Hyprland dispatchers expect
    pub fn address(&self) -> String {
        format!("0x{:x}", self.pane_id)
    }
}

impl fmt::Display for PaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address(), self.container_id)
    }
}

/// A single sighting of a pane in the history ledger.
///
/// `offset` is relative to the present: `0` is the present, negative values
/// lie in the past and positive values in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: PaneKey,
    pub offset: i64,
}

impl HistoryEntry {
    pub fn present(key: PaneKey) -> Self {
        Self { key, offset: 0 }
    }

    pub fn is_present(&self) -> bool {
        self.offset == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses_with_and_without_prefix() {
        assert_eq!(PaneKey::parse_address("0x55d1c0a3b2e0"), Some(0x55d1c0a3b2e0));
        assert_eq!(PaneKey::parse_address("55d1c0a3b2e0"), Some(0x55d1c0a3b2e0));
        assert_eq!(PaneKey::parse_address("0x"), None);
        assert_eq!(PaneKey::parse_address("not-hex"), None);
    }

    #[test]
    fn address_round_trips_through_dispatcher_form() {
        let key = PaneKey::new(0xdeadbeef, 3);
        assert_eq!(key.address(), "0xdeadbeef");
        assert_eq!(PaneKey::parse_address(&key.address()), Some(key.pane_id));
        assert_eq!(key.to_string(), "0xdeadbeef@3");
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(PaneKey::new(1, 2), PaneKey::new(1, 2));
        assert_ne!(PaneKey::new(1, 2), PaneKey::new(1, 3));
    }
}

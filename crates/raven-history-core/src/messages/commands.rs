use std::fmt;

/// Direction of a history traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Back => "back",
            Self::Forward => "forward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Commands accepted on the control socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Step back/forward through history
    Traverse(Direction),

    /// Report the ledger and coordinator flags
    Status,

    /// Forget all history
    Clear,

    /// Re-read the config file
    ReloadConfig,
}

impl ControlCommand {
    /// Parse from a control socket line
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "back" | "prev" | "previous" => Some(Self::Traverse(Direction::Back)),
            "forward" | "next" => Some(Self::Traverse(Direction::Forward)),
            "status" => Some(Self::Status),
            "clear" => Some(Self::Clear),
            "reload-config" | "reload" => Some(Self::ReloadConfig),
            _ => None,
        }
    }

    /// Wire form sent by the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traverse(direction) => direction.name(),
            Self::Status => "status",
            Self::Clear => "clear",
            Self::ReloadConfig => "reload-config",
        }
    }
}

mod history;
mod paths;

pub use history::HistoryConfig;
pub use paths::ConfigPaths;

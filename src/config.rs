//! Leaderboard configuration.

use std::path::PathBuf;

/// Settings for one leaderboard instance and the process hosting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardConfig {
    /// Leaderboard name, carried into logs and snapshots.
    pub name: String,
    /// Players to pre-allocate room for.
    pub initial_capacity: usize,
    /// Where to persist snapshots. `None` disables persistence.
    pub snapshot_path: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            name: "leaderboard".to_string(),
            initial_capacity: 1024,
            snapshot_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl LeaderboardConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            name: lookup("LEADERBOARD_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.name),
            initial_capacity: lookup("LEADERBOARD_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_capacity),
            snapshot_path: lookup("LEADERBOARD_SNAPSHOT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_filter: lookup("LEADERBOARD_LOG")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }
}

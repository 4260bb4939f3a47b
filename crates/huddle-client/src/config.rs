//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration.

use std::path::PathBuf;

use directories::ProjectDirs;

use huddle_shared::constants::{APP_NAME, DEFAULT_MESSAGE_MAX_LEN};

use crate::reconcile::ReconcileStrategy;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite file backing the local backend.
    /// Env: `HUDDLE_DB_PATH`
    /// Default: the platform data directory, e.g.
    /// `~/.local/share/huddle/huddle.db` on Linux.
    pub database_path: PathBuf,

    /// How participant edits are written.
    /// Env: `HUDDLE_RECONCILE` (`diff` / `replace`)
    /// Default: `diff`
    pub reconcile_strategy: ReconcileStrategy,

    /// Maximum chat message length in characters.
    /// Env: `HUDDLE_MESSAGE_MAX_LEN`
    /// Default: `2000`
    pub message_max_len: usize,

    /// Buffer of the in-process event bus.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            reconcile_strategy: ReconcileStrategy::default(),
            message_max_len: DEFAULT_MESSAGE_MAX_LEN,
            event_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("HUDDLE_DB_PATH") {
            if !path.trim().is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }

        if let Some(value) = lookup("HUDDLE_RECONCILE") {
            match value.parse::<ReconcileStrategy>() {
                Ok(strategy) => config.reconcile_strategy = strategy,
                Err(e) => {
                    tracing::warn!(value = %value, error = %e, "Invalid HUDDLE_RECONCILE, using default");
                }
            }
        }

        if let Some(value) = lookup("HUDDLE_MESSAGE_MAX_LEN") {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => config.message_max_len = n,
                _ => {
                    tracing::warn!(value = %value, "Invalid HUDDLE_MESSAGE_MAX_LEN, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn default_database_path() -> PathBuf {
    match ProjectDirs::from("com", "huddle", APP_NAME) {
        Some(dirs) => dirs.data_dir().join("huddle.db"),
        None => PathBuf::from("huddle.db"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::from_vars(vars(&[]));
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::Diff);
        assert_eq!(config.message_max_len, 2000);
        assert!(config.database_path.ends_with("huddle.db"));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_vars(vars(&[
            ("HUDDLE_DB_PATH", "/tmp/h.db"),
            ("HUDDLE_RECONCILE", "replace"),
            ("HUDDLE_MESSAGE_MAX_LEN", "140"),
        ]));
        assert_eq!(config.database_path, PathBuf::from("/tmp/h.db"));
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::FullReplace);
        assert_eq!(config.message_max_len, 140);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ClientConfig::from_vars(vars(&[
            ("HUDDLE_RECONCILE", "merge"),
            ("HUDDLE_MESSAGE_MAX_LEN", "0"),
        ]));
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::Diff);
        assert_eq!(config.message_max_len, 2000);
    }
}

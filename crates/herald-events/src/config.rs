//! Emitter configuration.
//!
//! # Environment Variables
//!
//! - `HERALD_MAX_LISTENERS`: Override the default listener limit per event

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable for the default listener limit.
pub const MAX_LISTENERS_ENV: &str = "HERALD_MAX_LISTENERS";

/// Listener limit per event before a leak warning is issued.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Configuration for an [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Listener count per event above which a leak warning is issued once.
    /// `0` disables the warning.
    pub max_listeners: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl EmitterConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config from defaults overridden by environment variables.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        let raw = std::env::var(MAX_LISTENERS_ENV).ok();
        Self::new().with_env_override(raw.as_deref())
    }

    /// Sets the listener limit per event.
    pub fn with_max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    fn with_env_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.trim().parse::<usize>() {
                Ok(max) => self.max_listeners = max,
                Err(e) => {
                    warn!(var = MAX_LISTENERS_ENV, value = %raw, error = %e, "ignoring invalid listener limit");
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmitterConfig::default();
        assert_eq!(config.max_listeners, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = EmitterConfig::new().with_max_listeners(3);
        assert_eq!(config.max_listeners, 3);
    }

    #[test]
    fn test_env_override() {
        let config = EmitterConfig::new().with_env_override(Some(" 25 "));
        assert_eq!(config.max_listeners, 25);

        let config = EmitterConfig::new().with_env_override(Some("0"));
        assert_eq!(config.max_listeners, 0);
    }

    #[test]
    fn test_env_override_invalid_ignored() {
        let config = EmitterConfig::new().with_env_override(Some("lots"));
        assert_eq!(config.max_listeners, DEFAULT_MAX_LISTENERS);

        let config = EmitterConfig::new().with_env_override(Some("-1"));
        assert_eq!(config.max_listeners, DEFAULT_MAX_LISTENERS);

        let config = EmitterConfig::new().with_env_override(None);
        assert_eq!(config.max_listeners, DEFAULT_MAX_LISTENERS);
    }

    #[test]
    fn test_deserialize() {
        let config: EmitterConfig = serde_json::from_str(r#"{"max_listeners": 4}"#).unwrap();
        assert_eq!(config.max_listeners, 4);

        let config: EmitterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EmitterConfig::default());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(EmitterConfig::new().with_max_listeners(2)).unwrap();
        assert_eq!(json["max_listeners"], 2);
    }
}

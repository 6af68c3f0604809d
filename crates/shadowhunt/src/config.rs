//! Server configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shadowhunt_session::SessionConfig;
use tracing::info;

use crate::ShadowhuntError;

/// Everything a Shadowhunt server needs at startup.
///
/// Every field is defaulted, so a config file only has to name what it
/// changes:
///
/// ```json
/// { "session": { "max_participants": 4, "match": { "max_game_time": { "secs": 180, "nanos": 0 } } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Settings for every session the server creates.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ShadowhuntError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShadowhuntError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), "loaded server config");
        Ok(config)
    }

    /// Clamps nested values. See [`SessionConfig::validated`].
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shadowhunt_session::RolePolicy;

    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = ServerConfig::from_json("{}").unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.session.max_participants, 5);
    }

    #[test]
    fn test_nested_overrides() {
        let json = r#"{
            "log_filter": "shadowhunt=debug",
            "session": {
                "role_policy": "HostIsShadow",
                "match": { "max_game_time": { "secs": 180, "nanos": 0 } }
            }
        }"#;
        let config = ServerConfig::from_json(json).unwrap();
        assert_eq!(config.log_filter, "shadowhunt=debug");
        assert_eq!(config.session.role_policy, RolePolicy::HostIsShadow);
        assert_eq!(
            config.session.match_config.max_game_time,
            Duration::from_secs(180)
        );
        assert_eq!(config.session.min_participants, 2);
    }

    #[test]
    fn test_bounds_are_validated_on_load() {
        let json = r#"{ "session": { "min_participants": 9, "max_participants": 3 } }"#;
        let config = ServerConfig::from_json(json).unwrap();
        assert_eq!(config.session.min_participants, 3);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = ServerConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ShadowhuntError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ServerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ShadowhuntError::Io(_)));
    }
}

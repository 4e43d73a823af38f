//! Process configuration, loaded once at startup.
//!
//! ```toml
//! [store]
//! root = "/var/lib/phoenix"
//!
//! [elasticsearch]
//! endpoint = "https://search.example.org:9200"
//! username = "phoenix"
//! password = "secret"
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::Path;

use phoenix_index::ElasticsearchConfig;
use phoenix_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoenixConfig {
    #[serde(default)]
    pub store: StoreConfig,

    /// Name and topic index backend. Required by
    /// [`Repository::open`](crate::Repository::open).
    #[serde(default)]
    pub elasticsearch: Option<ElasticsearchConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl PhoenixConfig {
    pub fn from_toml_str(text: &str) -> RepoResult<Self> {
        toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> RepoResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("unable to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PhoenixConfig::from_toml_str("").unwrap();
        assert_eq!(config, PhoenixConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.store.root, PathBuf::from("phoenix-data"));
        assert!(config.elasticsearch.is_none());
    }

    #[test]
    fn full_file() {
        let config = PhoenixConfig::from_toml_str(
            r#"
            [store]
            root = "/var/lib/phoenix"

            [elasticsearch]
            endpoint = "https://search.example.org:9200"
            username = "phoenix"
            password = "secret"
            topic_index = "topics_test"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.root, PathBuf::from("/var/lib/phoenix"));
        let es = config.elasticsearch.unwrap();
        assert_eq!(es.endpoint, "https://search.example.org:9200");
        assert_eq!(es.username.as_deref(), Some("phoenix"));
        assert_eq!(es.topic_index, "topics_test");
        assert_eq!(es.page_index, "page_name");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn debug_output_hides_password() {
        let config = PhoenixConfig::from_toml_str(
            r#"
            [elasticsearch]
            endpoint = "https://search.example.org:9200"
            password = "s3cr3t-value"
            "#,
        )
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("search.example.org"));
        assert!(!rendered.contains("s3cr3t-value"));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let err = PhoenixConfig::from_toml_str("[store\nroot = 1").unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phoenix.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(PhoenixConfig::load(&path).unwrap().logging.level, "warn");

        let err = PhoenixConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }
}

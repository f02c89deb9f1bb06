//! RON configuration for the `docgrab` binary.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use docgrab_core::DEFAULT_INTER_ITEM_DELAY_MS;
use docgrab_engine::{
    ConflictPolicy, CredentialSource, EngineConfig, EnvCredentialSource, FetchSettings,
    StorageSnapshotSource, DEFAULT_API_BASE_URL,
};
use engine_logging::{LogDestination, LogSettings, DEFAULT_LOG_FILE};
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "docgrab.ron";
pub const DEFAULT_CREDENTIAL_ENV: &str = "DOCGRAB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unknown log level `{0}`")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_base_url: String,
    pub output_dir: PathBuf,
    pub credential_cache: PathBuf,
    /// JSON dump of the page's local storage, read when nothing is cached.
    pub storage_snapshot: Option<PathBuf>,
    /// Environment variable consulted when no snapshot is configured.
    pub credential_env: String,
    pub inter_item_delay_ms: u64,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub max_bytes: u64,
    pub conflict_policy: ConflictPolicy,
    pub log_level: String,
    pub log_destination: LogDestination,
    /// File the settings came from; `None` when running on defaults.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            output_dir: PathBuf::from("downloads"),
            credential_cache: PathBuf::from("docgrab_storage.json"),
            storage_snapshot: None,
            credential_env: DEFAULT_CREDENTIAL_ENV.to_string(),
            inter_item_delay_ms: DEFAULT_INTER_ITEM_DELAY_MS,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            max_bytes: FetchSettings::default().max_bytes,
            conflict_policy: ConflictPolicy::default(),
            log_level: "info".to_string(),
            log_destination: LogDestination::default(),
            loaded_from: None,
        }
    }
}

impl AppConfig {
    /// Load `path`, or `./docgrab.ron` when no path is given.
    ///
    /// An explicit path must exist; the implicit default may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.loaded_from = Some(path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    pub fn log_settings(&self) -> Result<LogSettings, ConfigError> {
        let level = self
            .log_level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))?;
        Ok(LogSettings {
            destination: self.log_destination,
            level,
            file_path: PathBuf::from(DEFAULT_LOG_FILE),
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            base_url: self.api_base_url.clone(),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_bytes: self.max_bytes,
        }
    }

    pub fn credential_source(&self) -> Arc<dyn CredentialSource> {
        match &self.storage_snapshot {
            Some(path) => Arc::new(StorageSnapshotSource::new(path.clone())),
            None => Arc::new(EnvCredentialSource::new(self.credential_env.clone())),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default_with_output(self.output_dir.clone());
        config.fetch = self.fetch_settings();
        config.conflict = self.conflict_policy;
        config.credential_cache = self.credential_cache.clone();
        config.credential_source = self.credential_source();
        config.inter_item_delay = Duration::from_millis(self.inter_item_delay_ms);
        config.clock = Arc::new(|| Utc::now().timestamp_millis().max(0) as u64);
        config
    }
}

//! Startup configuration for the province store.
//!
//! Loaded from `store_config.json` with support for environment variable overrides.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy_ecs::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::state::MAX_PROVINCE_CAPACITY;

pub const BUILTIN_STORE_CONFIG: &str = include_str!("data/store_config.json");

pub const STORE_CONFIG_ENV: &str = "PROVINCE_STORE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Province ceiling. Fixes the hot allocation for the store's lifetime.
    pub capacity: u32,
    pub validate_after_load: bool,
    /// Ticks between checksum captures. Zero disables capture.
    pub checksum_interval_ticks: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            validate_after_load: true,
            checksum_interval_ticks: 1,
        }
    }
}

impl StoreConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_STORE_CONFIG).expect("builtin store config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        StoreConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity > MAX_PROVINCE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "capacity {} exceeds the 16-bit id space ({})",
                self.capacity, MAX_PROVINCE_CAPACITY
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse store config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read store config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid store config: {0}")]
    Invalid(String),
}

#[derive(Resource, Debug, Clone)]
pub struct StoreConfigHandle(pub Arc<StoreConfig>);

impl StoreConfigHandle {
    pub fn new(config: Arc<StoreConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<StoreConfig> {
        Arc::clone(&self.0)
    }
}

/// Where the active configuration came from. `None` means it was not read
/// from a file.
#[derive(Resource, Debug, Clone, Default)]
pub struct StoreConfigMetadata {
    path: Option<PathBuf>,
}

impl StoreConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the store configuration from `PROVINCE_STORE_CONFIG_PATH`, falling back
/// to the builtin copy.
pub fn load_store_config_from_env() -> (Arc<StoreConfig>, StoreConfigMetadata) {
    if let Some(path) = env::var_os(STORE_CONFIG_ENV).map(PathBuf::from) {
        match StoreConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "province_core::config",
                    path = %path.display(),
                    capacity = config.capacity,
                    "store_config.loaded=file"
                );
                return (Arc::new(config), StoreConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "province_core::config",
                    path = %path.display(),
                    error = %err,
                    "store_config.load_failed"
                );
            }
        }
    }

    let config = StoreConfig::builtin();
    tracing::info!(
        target: "province_core::config",
        capacity = config.capacity,
        "store_config.loaded=builtin"
    );
    (config, StoreConfigMetadata::new(None))
}

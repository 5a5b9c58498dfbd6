//! Configuration for the fingerprint cache and external tool
//!
//! The cache section is read live on every cache operation, so toggling the
//! enabled flag or moving the cache directory takes effect immediately
//! without a restart.

use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChromacacheConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tool: ToolConfig,
}

/// Fingerprint cache configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: default_cache_directory(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_directory() -> PathBuf {
    PathBuf::from("./fpcache")
}

/// External analysis tool configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ToolConfig {
    #[serde(default = "default_tool_binary")]
    pub binary: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: default_tool_binary(),
        }
    }
}

fn default_tool_binary() -> PathBuf {
    PathBuf::from("fpcalc")
}

impl Default for ChromacacheConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            tool: ToolConfig::default(),
        }
    }
}

impl ChromacacheConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self, FingerprintError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FingerprintError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        toml::from_str(&content).map_err(|e| FingerprintError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Source of the live cache configuration.
///
/// Implementations are consulted on every cache operation, never cached in
/// memory by the callers.
pub trait ConfigSource: Send + Sync {
    fn cache_config(&self) -> CacheConfig;
}

/// File-backed source that re-reads the TOML file on every call
pub struct TomlConfigSource {
    path: PathBuf,
}

impl TomlConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for TomlConfigSource {
    fn cache_config(&self) -> CacheConfig {
        match ChromacacheConfig::load(&self.path) {
            Ok(config) => config.cache,
            Err(e) => {
                // An unreadable config disables caching rather than guessing
                // at a directory.
                log::warn!("{}; caching disabled for this operation", e);
                CacheConfig {
                    enabled: false,
                    ..CacheConfig::default()
                }
            }
        }
    }
}

/// Fixed configuration, for tests and flag-driven CLI runs
pub struct StaticConfig {
    cache: CacheConfig,
}

impl StaticConfig {
    pub fn new(cache: CacheConfig) -> Self {
        Self { cache }
    }

    /// Caching enabled with the given directory
    pub fn enabled(directory: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::new(CacheConfig {
            enabled: true,
            directory: directory.into(),
        }))
    }

    /// Caching disabled
    pub fn disabled() -> Arc<Self> {
        Arc::new(Self::new(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        }))
    }
}

impl ConfigSource for StaticConfig {
    fn cache_config(&self) -> CacheConfig {
        self.cache.clone()
    }
}

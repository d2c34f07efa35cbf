//! Bridge configuration
//!
//! Loaded by the application from whatever format it already uses; every
//! field has a default so an empty table is a valid production config.
//!
//! ```toml
//! [hot_reload]
//! enabled = true
//! debounce_ms = 50
//!
//! [hot_reload.modules]
//! "app::Counter" = "src/counter"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub hot_reload: HotReloadConfig,
}

impl BridgeConfig {
    /// Development preset: hot reload on, no watched sources
    pub fn development() -> Self {
        Self {
            hot_reload: HotReloadConfig {
                enabled: true,
                ..HotReloadConfig::default()
            },
        }
    }
}

/// Configuration for hot-reload
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HotReloadConfig {
    /// Build descriptors in hot mode
    pub enabled: bool,
    /// Wait for file changes to settle
    pub debounce_ms: u64,
    /// Source path per module id
    pub modules: BTreeMap<String, PathBuf>,
}

impl HotReloadConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: 100,
            modules: BTreeMap::new(),
        }
    }
}

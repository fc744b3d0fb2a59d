//! Configuration for shelfkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration shared by every store opened through it
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for named stores
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── books.isbn       (one file per named index)
    ///     └── users.id
    pub data_dir: PathBuf,

    /// Create missing store files on open instead of failing
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync store files
    pub sync_strategy: SyncStrategy,
}

/// Store sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS (fastest, only `sync()`/`close()` fsync)
    Never,

    /// fsync after every mutating call (safest, slowest)
    EveryWrite,

    /// fsync after N mutating calls (balanced durability/performance)
    EveryNWrites { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shelfkv_data"),
            create_if_missing: true,
            sync_strategy: SyncStrategy::EveryNWrites { count: 256 },
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve the file path of a named store
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all named stores)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set whether missing stores are created on open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

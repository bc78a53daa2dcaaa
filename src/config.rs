//! Runtime configuration for the store and the search engine.
//!
//! Every option has a working default, so `DegreesConfig::default()` is what
//! the command line uses unless a flag overrides a field.
//!
//! ```rust
//! use sixdegrees::DegreesConfig;
//!
//! let cfg = DegreesConfig::default().with_root("Kevin Bacon").with_batch_size(50);
//! assert_eq!(cfg.search.batch_size, 50);
//! ```

use std::path::Path;

use crate::{DegreesError, graph::SqliteStore};

/// Name of the person all distances are measured against, unless overridden.
pub const DEFAULT_ROOT_NAME: &str = "Kevin Bacon";

/// Largest number of results written in one store transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Neighbor visits between two progress log events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 250;

/// Database argument that selects a throwaway in-memory store.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Capacity of rusqlite's prepared statement cache.
    pub statement_cache_capacity: usize,
    /// Upper bound on memoized neighbor lists per side; `Some(0)` disables
    /// memoization and `None` leaves it unbounded.
    pub adjacency_cache_capacity: Option<usize>,
    /// Extra `PRAGMA name = value` statements applied after opening.
    pub pragma_settings: Vec<(String, String)>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            statement_cache_capacity: 128,
            adjacency_cache_capacity: None,
            pragma_settings: Vec::new(),
        }
    }
}

impl StoreConfig {
    pub fn with_pragma(mut self, name: &str, value: &str) -> Self {
        self.pragma_settings.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub batch_size: usize,
    pub progress_interval: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DegreesConfig {
    pub root_name: String,
    pub store: StoreConfig,
    pub search: SearchOptions,
}

impl Default for DegreesConfig {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            store: StoreConfig::default(),
            search: SearchOptions::default(),
        }
    }
}

impl DegreesConfig {
    pub fn with_root(mut self, name: &str) -> Self {
        self.root_name = name.to_string();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.search.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), DegreesError> {
        if self.root_name.trim().is_empty() {
            return Err(DegreesError::invalid_input("root name must be set"));
        }
        if self.search.batch_size == 0 {
            return Err(DegreesError::invalid_input("batch size must be positive"));
        }
        Ok(())
    }
}

/// Opens `database` as a file path, or an in-memory store for `"memory"`.
pub fn open_store(database: &str, cfg: &StoreConfig) -> Result<SqliteStore, DegreesError> {
    if database == MEMORY_DATABASE {
        SqliteStore::open_in_memory_with(cfg)
    } else {
        SqliteStore::open_with(Path::new(database), cfg)
    }
}

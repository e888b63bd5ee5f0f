//! Configuration types for persistence components.
//!
//! Configuration is plain data deserialized with serde, so it can come from any
//! source the application already uses (a JSON file, environment-derived values, ...).
//!
//! ```ignore
//! use memlayer::config::MemoryPersistenceConfig;
//! use serde_json::json;
//!
//! let config = MemoryPersistenceConfig::from_json(json!({
//!     "options": { "max_page_size": 50 }
//! }))?;
//!
//! assert_eq!(config.options.max_page_size, 50);
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Page size used when a caller does not bound a page.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Tunable options of an in-memory persistence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PersistenceOptions {
    /// Maximum number of items returned in one page.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

fn default_max_page_size() -> usize {
    DEFAULT_MAX_PAGE_SIZE
}

/// Configuration of an in-memory persistence.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MemoryPersistenceConfig {
    #[serde(default)]
    pub options: PersistenceOptions,
}

impl MemoryPersistenceConfig {
    /// Parses the configuration from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the value has the wrong shape.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        parse_config(value)
    }
}

/// Deserializes a configuration value, reporting failures as configuration errors.
pub fn parse_config<C: DeserializeOwned>(value: Value) -> StoreResult<C> {
    serde_json::from_value(value).map_err(|e| StoreError::Configuration(e.to_string()))
}

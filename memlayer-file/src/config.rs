//! Configuration of the file-backed components.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use memlayer_core::{
    config::{MemoryPersistenceConfig, parse_config},
    error::StoreResult,
};

/// Configuration of a [`JsonFilePersister`](crate::JsonFilePersister).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JsonFilePersisterConfig {
    /// Location of the data file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl JsonFilePersisterConfig {
    pub fn from_json(value: Value) -> StoreResult<Self> {
        parse_config(value)
    }
}

/// Configuration of an [`IdentifiableJsonFilePersistence`](crate::IdentifiableJsonFilePersistence).
///
/// Both halves share one flat JSON object:
///
/// ```json
/// { "options": { "max_page_size": 100 }, "path": "./data/items.json" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JsonFilePersistenceConfig {
    #[serde(flatten)]
    pub persistence: MemoryPersistenceConfig,
    #[serde(flatten)]
    pub persister: JsonFilePersisterConfig,
}

impl JsonFilePersistenceConfig {
    /// Parses the configuration from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`](memlayer_core::error::StoreError::Configuration)
    /// if the value has the wrong shape.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        parse_config(value)
    }
}

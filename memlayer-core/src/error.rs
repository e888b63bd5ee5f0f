//! Error types and result types for persistence operations.
//!
//! This module provides the error taxonomy shared by every persistence component.
//! Use [`StoreResult<T>`] as the return type for fallible operations.
//!
//! Absence of a record is never an error: lookups return `Option` or an empty `Vec`.

use serde_json::Error as SerdeJsonError;
use std::{error::Error as StdError, path::PathBuf};
use thiserror::Error;

/// Boxed source error carried by I/O failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors that can occur when interacting with a persistence component.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Required configuration is missing or invalid (e.g. no file path was set).
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Reading the backing store failed. Wraps the underlying I/O or parse failure.
    #[error("Failed to read data from {}", path.display())]
    Read {
        /// Location that was being read.
        path: PathBuf,
        /// The originating failure.
        #[source]
        source: BoxError,
    },
    /// Writing the backing store failed. Wraps the underlying I/O or serialization failure.
    #[error("Failed to write data to {}", path.display())]
    Write {
        /// Location that was being written.
        path: PathBuf,
        /// The originating failure.
        #[source]
        source: BoxError,
    },
    /// A record with the given identifier is already stored.
    #[error("Record {0} already exists")]
    AlreadyExists(String),
    /// Conversion between a record and its JSON representation failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A custom loader or saver reported a failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Builds a [`StoreError::Read`] from any error type.
    pub fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        StoreError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Builds a [`StoreError::Write`] from any error type.
    pub fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        StoreError::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A specialized `Result` type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

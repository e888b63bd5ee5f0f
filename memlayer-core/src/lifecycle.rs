//! Lifecycle traits shared by persistence components.

use async_trait::async_trait;

use crate::error::StoreResult;

/// A component that must be opened before use and closed afterwards.
#[async_trait]
pub trait Openable: Send + Sync {
    /// Returns `true` while the component is open.
    fn is_open(&self) -> bool;

    /// Opens the component, loading any durable state.
    async fn open(&self) -> StoreResult<()>;

    /// Closes the component, flushing any durable state.
    async fn close(&self) -> StoreResult<()>;
}

/// A component whose contents can be wiped.
#[async_trait]
pub trait Cleanable: Send + Sync {
    /// Removes every record.
    async fn clear(&self) -> StoreResult<()>;
}

/// A component that accepts configuration before it is opened.
pub trait Configurable {
    /// The configuration type accepted by this component.
    type Config;

    /// Applies `config`. Must not be called while operations are in flight.
    fn configure(&mut self, config: &Self::Config);
}

//! Convenient re-exports of commonly used types from memlayer.
//!
//! ```ignore
//! use memlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The `Identifiable` trait and its derive macro
//! - Both persistence layers and the CRUD capability traits
//! - Filters, sorts and paging
//! - Lifecycle traits and error types

pub use memlayer_core::{
    backend::{Loader, Saver},
    config::{MemoryPersistenceConfig, PersistenceOptions},
    crud::{FilteredPager, Getter, PartialUpdater, Setter, Writer},
    error::{StoreError, StoreResult},
    lifecycle::{Cleanable, Configurable, Openable},
    page::{Page, PagingParams},
    query::{Filter, Sort, SortDirection},
    record::{IdGenerator, Identifiable, RecordExt},
};
pub use memlayer_macros::Identifiable;
pub use memlayer_memory::{IdentifiableMemoryPersistence, MemoryPersistence};

//! Main memlayer crate providing generic in-memory persistence for application records.
//!
//! This crate is the primary entry point for users of memlayer. It re-exports the core
//! types from the sub-crates and gives access to the storage backends.
//!
//! # Features
//!
//! - **Collection engine** - An ordered working set with filtering, stable sorting,
//!   paging with optional totals, counting and random sampling
//! - **Identity CRUD** - Identifier generation, upsert, partial updates and batch
//!   get/delete for records deriving [`Identifiable`]
//! - **Capability traits** - [`crud`] traits let code work with any persistence
//! - **Pluggable durability** - Attach any [`Loader`](backend::Loader) and
//!   [`Saver`](backend::Saver); a JSON file backend ships with the `file` feature
//!
//! # Quick Start
//!
//! ```ignore
//! use memlayer::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Identifiable)]
//! pub struct Note {
//!     pub id: Option<String>,
//!     pub key: String,
//!     pub content: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let notes = IdentifiableMemoryPersistence::<Note>::new();
//!     notes.open().await?;
//!
//!     notes.create(Note { id: None, key: "K1".into(), content: "C1".into() }).await?;
//!     notes.create(Note { id: None, key: "K2".into(), content: "C2".into() }).await?;
//!
//!     let page = notes
//!         .get_page_by_filter(
//!             Some(&Filter::new(|n: &Note| n.key.starts_with('K'))),
//!             Some(&PagingParams::builder().with_take(10).with_total(true).build()),
//!             Some(&Sort::by_key_desc(|n: &Note| n.key.clone())),
//!         )
//!         .await?;
//!
//!     assert_eq!(page.total, Some(2));
//!
//!     notes.close().await
//! }
//! ```
//!
//! # File Storage
//!
//! ```ignore
//! use memlayer::{prelude::*, file::IdentifiableJsonFilePersistence};
//!
//! let notes = IdentifiableJsonFilePersistence::<Note>::with_path("./data/notes.json");
//! notes.open().await?;
//!
//! // Every mutation rewrites ./data/notes.json
//! notes.create(Note { id: None, key: "K1".into(), content: "C1".into() }).await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The in-memory engine, transient unless a backend is attached
//! - [`file`] - JSON file storage (requires the `file` feature)

#[allow(unused_extern_crates)]
extern crate self as memlayer;

pub mod prelude;

pub use memlayer_core::{backend, config, crud, error, lifecycle, page, query, record};
pub use memlayer_macros::Identifiable;

pub use serde_json;

/// In-memory persistence implementations.
pub mod memory {
    pub use memlayer_memory::{
        IdentifiableMemoryPersistence, MemoryPersistence, MemoryPersistenceBuilder,
    };
}

/// JSON file storage.
///
/// This module is only available when the `file` feature is enabled.
#[cfg(feature = "file")]
pub mod file {
    pub use memlayer_file::{
        IdentifiableJsonFilePersistence, JsonFilePersistenceConfig, JsonFilePersister,
        JsonFilePersisterConfig,
    };
}

//! JSON file storage for memlayer.
//!
//! - [`JsonFilePersister`] - a [`Loader`](memlayer_core::backend::Loader) and
//!   [`Saver`](memlayer_core::backend::Saver) that keeps the whole collection as one
//!   JSON array in a single file
//! - [`IdentifiableJsonFilePersistence`] - identity-aware in-memory persistence wired
//!   to that persister
//!
//! # Quick Start
//!
//! ```ignore
//! use memlayer::prelude::*;
//! use memlayer::file::IdentifiableJsonFilePersistence;
//!
//! let notes = IdentifiableJsonFilePersistence::<Note>::with_path("./data/notes.json");
//! notes.open().await?;
//!
//! let note = notes.create(Note { id: None, content: "hello".into() }).await?;
//!
//! notes.close().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as memlayer_file;

pub mod config;
pub mod persistence;
pub mod persister;

pub use config::{JsonFilePersistenceConfig, JsonFilePersisterConfig};
pub use persistence::IdentifiableJsonFilePersistence;
pub use persister::JsonFilePersister;

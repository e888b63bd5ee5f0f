//! In-memory persistence for memlayer.
//!
//! This crate provides the record-management engine:
//!
//! - [`MemoryPersistence`] - an ordered working set with filtering, sorting, paging,
//!   counting, random sampling and filtered deletes, flushed to an optional saver
//! - [`IdentifiableMemoryPersistence`] - id-aware CRUD on top of it: identifier
//!   generation, upsert, partial updates and batch get/delete
//!
//! Without a loader or saver attached the persistence is purely transient, which makes
//! it suitable for tests and caches. Attach a backend (such as the JSON file persister)
//! to make it durable.
//!
//! # Quick Start
//!
//! ```ignore
//! use memlayer::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Identifiable)]
//! pub struct Note {
//!     pub id: Option<String>,
//!     pub content: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let notes = IdentifiableMemoryPersistence::<Note>::new();
//!     notes.open().await?;
//!
//!     let note = notes.create(Note { id: None, content: "hello".into() }).await?;
//!     assert!(note.id.is_some());
//!
//!     notes.close().await
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as memlayer_memory;

pub mod identifiable;
pub mod persistence;

pub use identifiable::IdentifiableMemoryPersistence;
pub use persistence::{MemoryPersistence, MemoryPersistenceBuilder};

//! A thin in-memory record persistence layer with pluggable durable backends.
//!
//! This crate is the core of the memlayer project and provides:
//!
//! - **Record traits** ([`record`]) - Identifiers, identifier generation and JSON conversion
//! - **Backend contracts** ([`backend`]) - Loader and saver traits for durable storage
//! - **CRUD capabilities** ([`crud`]) - Traits for id lookups, writes, upserts, partial updates and paging
//! - **Filter and sort strategies** ([`query`]) - Predicates and comparators over records
//! - **Paging** ([`page`]) - Page results and paging parameters
//! - **Lifecycle traits** ([`lifecycle`]) - Open/close, clear and configure
//! - **Configuration** ([`config`]) - Serde-backed configuration types
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use memlayer::record::Identifiable;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Note {
//!     pub id: Option<String>,
//!     pub content: String,
//! }
//!
//! impl Identifiable for Note {
//!     type Key = String;
//!
//!     fn id(&self) -> Option<&String> {
//!         self.id.as_ref()
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = Some(id);
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as memlayer_core;

pub mod backend;
pub mod config;
pub mod crud;
pub mod error;
pub mod lifecycle;
pub mod page;
pub mod query;
pub mod record;

//! CRUD capability traits.
//!
//! Each trait covers one capability of a persistence component, so code can depend on
//! exactly what it uses and work with any implementation (in-memory, file-backed, ...).
//!
//! # Traits
//!
//! - [`Getter`]: Lookups by identifier
//! - [`Writer`]: Create, replace and delete by identifier
//! - [`Setter`]: Upsert
//! - [`PartialUpdater`]: Field-level updates
//! - [`FilteredPager`]: Filtered, sorted, paged reads
//!
//! # Examples
//!
//! ```ignore
//! use memlayer::crud::{Getter, Writer};
//!
//! async fn rename<P: Getter<Note> + Writer<Note>>(notes: &P, id: &String) -> StoreResult<()> {
//!     if let Some(mut note) = notes.get_one_by_id(id).await? {
//!         note.key = "renamed".into();
//!         notes.update(note).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    error::StoreResult,
    page::{Page, PagingParams},
    query::{Filter, Sort},
    record::Identifiable,
};

/// Reads records by identifier.
#[async_trait]
pub trait Getter<T: Identifiable>: Send + Sync {
    /// Returns the record with identifier `id`, or `None` if there is none.
    async fn get_one_by_id(&self, id: &T::Key) -> StoreResult<Option<T>>;

    /// Returns the records whose identifiers are in `ids`, in storage order.
    async fn get_list_by_ids(&self, ids: &[T::Key]) -> StoreResult<Vec<T>>;
}

/// Creates, replaces and deletes records by identifier.
#[async_trait]
pub trait Writer<T: Identifiable>: Send + Sync {
    /// Stores `item`, generating an identifier if it has none.
    async fn create(&self, item: T) -> StoreResult<T>;

    /// Replaces the stored record with `item`'s identifier. `None` if there is none.
    async fn update(&self, item: T) -> StoreResult<Option<T>>;

    /// Removes and returns the record with identifier `id`.
    async fn delete_by_id(&self, id: &T::Key) -> StoreResult<Option<T>>;
}

/// Inserts or replaces records.
#[async_trait]
pub trait Setter<T: Identifiable>: Send + Sync {
    async fn set(&self, item: T) -> StoreResult<T>;
}

/// Updates selected fields of a stored record.
#[async_trait]
pub trait PartialUpdater<T: Identifiable>: Send + Sync {
    /// Writes `fields` over the record with identifier `id`. `None` if there is none.
    async fn update_partially(
        &self,
        id: &T::Key,
        fields: &Map<String, Value>,
    ) -> StoreResult<Option<T>>;
}

/// Returns pages of filtered, sorted records.
#[async_trait]
pub trait FilteredPager<T: Send + Sync + 'static>: Send + Sync {
    async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>>;
}

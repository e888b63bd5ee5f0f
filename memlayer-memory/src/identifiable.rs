//! Identity-aware CRUD on top of the in-memory collection engine.
//!
//! [`IdentifiableMemoryPersistence`] keeps records that carry a unique identifier and
//! adds id-based get/update/delete, identifier generation, upsert, partial updates and
//! batch operations. Filtering, sorting, paging and saving are those of the wrapped
//! [`MemoryPersistence`].

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::trace;

use memlayer_core::{
    config::MemoryPersistenceConfig,
    crud::{FilteredPager, Getter, PartialUpdater, Setter, Writer},
    error::{StoreError, StoreResult},
    lifecycle::{Cleanable, Configurable, Openable},
    page::{Page, PagingParams},
    query::{Filter, Sort},
    record::{IdGenerator, Identifiable, RecordExt},
};

use crate::persistence::MemoryPersistence;

/// In-memory persistence for records with unique identifiers.
///
/// No two stored records share an identifier. Lookups by identifier address the
/// first matching record in working set order.
///
/// # Example
///
/// ```ignore
/// use memlayer::prelude::*;
///
/// let notes = IdentifiableMemoryPersistence::<Note>::new();
/// notes.open().await?;
///
/// let created = notes.create(Note { id: None, key: "K1".into(), content: "C1".into() }).await?;
/// let id = created.id.clone().unwrap();
///
/// let fields = serde_json::json!({ "content": "X" }).as_object().cloned().unwrap();
/// notes.update_partially(&id, &fields).await?;
///
/// assert_eq!(notes.get_one_by_id(&id).await?.unwrap().content, "X");
/// ```
#[derive(Debug)]
pub struct IdentifiableMemoryPersistence<T> {
    base: MemoryPersistence<T>,
}

impl<T: Identifiable> IdentifiableMemoryPersistence<T> {
    /// Creates a transient persistence with no loader and no saver.
    pub fn new() -> Self {
        Self::from(MemoryPersistence::new())
    }

    /// Returns the underlying collection engine.
    pub fn base(&self) -> &MemoryPersistence<T> {
        &self.base
    }

    /// Returns the underlying collection engine mutably, e.g. to swap its loader or saver.
    pub fn base_mut(&mut self) -> &mut MemoryPersistence<T> {
        &mut self.base
    }

    /// See [`MemoryPersistence::is_open`].
    pub fn is_open(&self) -> bool {
        self.base.is_open()
    }

    /// See [`MemoryPersistence::open`].
    pub async fn open(&self) -> StoreResult<()> {
        self.base.open().await
    }

    /// See [`MemoryPersistence::close`].
    pub async fn close(&self) -> StoreResult<()> {
        self.base.close().await
    }

    /// See [`MemoryPersistence::save`].
    pub async fn save(&self) -> StoreResult<()> {
        self.base.save().await
    }

    /// See [`MemoryPersistence::clear`].
    pub async fn clear(&self) -> StoreResult<()> {
        self.base.clear().await
    }

    /// See [`MemoryPersistence::get_page_by_filter`].
    pub async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>> {
        self.base.get_page_by_filter(filter, paging, sort).await
    }

    /// See [`MemoryPersistence::get_count_by_filter`].
    pub async fn get_count_by_filter(&self, filter: Option<&Filter<T>>) -> StoreResult<usize> {
        self.base.get_count_by_filter(filter).await
    }

    /// See [`MemoryPersistence::get_list_by_filter`].
    pub async fn get_list_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Vec<T>> {
        self.base.get_list_by_filter(filter, sort).await
    }

    /// See [`MemoryPersistence::get_one_random`].
    pub async fn get_one_random(&self, filter: Option<&Filter<T>>) -> StoreResult<Option<T>> {
        self.base.get_one_random(filter).await
    }

    /// See [`MemoryPersistence::delete_by_filter`].
    pub async fn delete_by_filter(&self, filter: &Filter<T>) -> StoreResult<usize> {
        self.base.delete_by_filter(filter).await
    }

    /// Returns the record with identifier `id`, or `None` if there is none.
    pub async fn get_one_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        let items = self.base.items.read().await;
        let found = items.iter().find(|item| item.has_id(id)).cloned();

        match &found {
            Some(_) => trace!(id = ?id, "Retrieved item by id"),
            None => trace!(id = ?id, "Item wasn't found by id"),
        }

        Ok(found)
    }

    /// Returns the records whose identifiers are in `ids`, in working set order.
    pub async fn get_list_by_ids(&self, ids: &[T::Key]) -> StoreResult<Vec<T>> {
        self.base
            .get_list_by_filter(Some(&id_filter(ids)), None)
            .await
    }

    /// Stores a copy of `item`, generating an identifier if it has none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] without saving if `item` carries an
    /// identifier that is already stored.
    pub async fn create(&self, mut item: T) -> StoreResult<T> {
        let mut items = self.base.items.write().await;

        match item.id() {
            Some(id) if items.iter().any(|stored| stored.has_id(id)) => {
                return Err(StoreError::AlreadyExists(format!("{id:?}")));
            }
            Some(_) => {}
            None => item.set_id(fresh_id(items.as_slice())),
        }

        items.push(item.clone());

        trace!(id = ?item.id(), "Created item");

        self.base.save_items(&items).await?;

        Ok(item)
    }

    /// Inserts or replaces a copy of `item`, generating an identifier if it has none.
    ///
    /// A stored record with the same identifier is replaced in place; otherwise the
    /// record is appended.
    pub async fn set(&self, mut item: T) -> StoreResult<T> {
        let mut items = self.base.items.write().await;

        if item.id().is_none() {
            item.set_id(fresh_id(items.as_slice()));
        }

        match items.iter().position(|stored| stored.id() == item.id()) {
            Some(index) => items[index] = item.clone(),
            None => items.push(item.clone()),
        }

        trace!(id = ?item.id(), "Set item");

        self.base.save_items(&items).await?;

        Ok(item)
    }

    /// Replaces the stored record that has `item`'s identifier with a copy of `item`.
    ///
    /// Fields of the stored record are not carried over. Returns `None` without
    /// saving if no record has that identifier.
    pub async fn update(&self, item: T) -> StoreResult<Option<T>> {
        let Some(id) = item.id() else {
            trace!("Item without id wasn't updated");
            return Ok(None);
        };

        let mut items = self.base.items.write().await;

        let Some(index) = items.iter().position(|stored| stored.has_id(id)) else {
            trace!(id = ?id, "Item wasn't found by id");
            return Ok(None);
        };

        items[index] = item.clone();

        trace!(id = ?id, "Updated item");

        self.base.save_items(&items).await?;

        Ok(Some(item))
    }

    /// Writes `fields` over the stored record with identifier `id`, leaving every other
    /// field untouched. The identifier itself is preserved.
    ///
    /// Returns `None` without saving if no record has that identifier.
    ///
    /// Fields that serde skips are reset to their defaults, see [`RecordExt::merge_fields`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the merged fields no longer form a valid record.
    pub async fn update_partially(
        &self,
        id: &T::Key,
        fields: &Map<String, Value>,
    ) -> StoreResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut items = self.base.items.write().await;

        let Some(index) = items.iter().position(|stored| stored.has_id(id)) else {
            trace!(id = ?id, "Item wasn't found by id");
            return Ok(None);
        };

        let mut merged = items[index].merge_fields(fields)?;
        merged.set_id(id.clone());
        items[index] = merged.clone();

        trace!(id = ?id, fields = fields.len(), "Partially updated item");

        self.base.save_items(&items).await?;

        Ok(Some(merged))
    }

    /// Removes and returns the record with identifier `id`.
    ///
    /// Returns `None` without saving if no record has that identifier.
    pub async fn delete_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        let mut items = self.base.items.write().await;

        let Some(index) = items.iter().position(|stored| stored.has_id(id)) else {
            trace!(id = ?id, "Item wasn't found by id");
            return Ok(None);
        };

        let removed = items.remove(index);

        trace!(id = ?id, "Deleted item");

        self.base.save_items(&items).await?;

        Ok(Some(removed))
    }

    /// Removes every record whose identifier is in `ids` and returns how many were removed.
    pub async fn delete_by_ids(&self, ids: &[T::Key]) -> StoreResult<usize> {
        self.base.delete_by_filter(&id_filter(ids)).await
    }
}

/// Generates an identifier that no stored record holds.
///
/// On the first collision every stored identifier is reserved, so a generator that
/// restarted below identifiers loaded from a backend catches up in one pass.
fn fresh_id<T: Identifiable>(items: &[T]) -> T::Key {
    let taken = |id: &T::Key| items.iter().any(|stored| stored.has_id(id));

    let id = T::Key::next_id();
    if !taken(&id) {
        return id;
    }

    items.iter().filter_map(T::id).for_each(<T::Key as IdGenerator>::reserve);

    loop {
        let id = T::Key::next_id();
        if !taken(&id) {
            return id;
        }
    }
}

fn id_filter<T: Identifiable>(ids: &[T::Key]) -> Filter<T> {
    let ids = ids.to_vec();
    Filter::new(move |item: &T| item.id().is_some_and(|id| ids.contains(id)))
}

impl<T> From<MemoryPersistence<T>> for IdentifiableMemoryPersistence<T> {
    fn from(base: MemoryPersistence<T>) -> Self {
        Self { base }
    }
}

impl<T: Identifiable> Default for IdentifiableMemoryPersistence<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Identifiable> Openable for IdentifiableMemoryPersistence<T> {
    fn is_open(&self) -> bool {
        self.base.is_open()
    }

    async fn open(&self) -> StoreResult<()> {
        self.base.open().await
    }

    async fn close(&self) -> StoreResult<()> {
        self.base.close().await
    }
}

#[async_trait]
impl<T: Identifiable> Cleanable for IdentifiableMemoryPersistence<T> {
    async fn clear(&self) -> StoreResult<()> {
        self.base.clear().await
    }
}

#[async_trait]
impl<T: Identifiable> Getter<T> for IdentifiableMemoryPersistence<T> {
    async fn get_one_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        IdentifiableMemoryPersistence::get_one_by_id(self, id).await
    }

    async fn get_list_by_ids(&self, ids: &[T::Key]) -> StoreResult<Vec<T>> {
        IdentifiableMemoryPersistence::get_list_by_ids(self, ids).await
    }
}

#[async_trait]
impl<T: Identifiable> Writer<T> for IdentifiableMemoryPersistence<T> {
    async fn create(&self, item: T) -> StoreResult<T> {
        IdentifiableMemoryPersistence::create(self, item).await
    }

    async fn update(&self, item: T) -> StoreResult<Option<T>> {
        IdentifiableMemoryPersistence::update(self, item).await
    }

    async fn delete_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        IdentifiableMemoryPersistence::delete_by_id(self, id).await
    }
}

#[async_trait]
impl<T: Identifiable> Setter<T> for IdentifiableMemoryPersistence<T> {
    async fn set(&self, item: T) -> StoreResult<T> {
        IdentifiableMemoryPersistence::set(self, item).await
    }
}

#[async_trait]
impl<T> PartialUpdater<T> for IdentifiableMemoryPersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn update_partially(
        &self,
        id: &T::Key,
        fields: &Map<String, Value>,
    ) -> StoreResult<Option<T>> {
        IdentifiableMemoryPersistence::update_partially(self, id, fields).await
    }
}

#[async_trait]
impl<T: Identifiable> FilteredPager<T> for IdentifiableMemoryPersistence<T> {
    async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>> {
        self.base.get_page_by_filter(filter, paging, sort).await
    }
}

impl<T> Configurable for IdentifiableMemoryPersistence<T> {
    type Config = MemoryPersistenceConfig;

    fn configure(&mut self, config: &MemoryPersistenceConfig) {
        self.base.configure(config);
    }
}

//! Identity-aware persistence stored in a JSON file.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{ops::Deref, path::PathBuf, sync::Arc};
use tracing::debug;

use memlayer_core::{
    backend::{Loader, Saver},
    crud::{FilteredPager, Getter, PartialUpdater, Setter, Writer},
    error::StoreResult,
    lifecycle::{Cleanable, Configurable, Openable},
    page::{Page, PagingParams},
    query::{Filter, Sort},
    record::Identifiable,
};
use memlayer_memory::{IdentifiableMemoryPersistence, MemoryPersistence};

use crate::{config::JsonFilePersistenceConfig, persister::JsonFilePersister};

/// [`IdentifiableMemoryPersistence`] whose working set is loaded from and saved to a
/// single JSON file.
///
/// All CRUD operations are reached through `Deref`. Every mutation rewrites the file.
///
/// # Example
///
/// ```ignore
/// use memlayer::prelude::*;
/// use memlayer::file::IdentifiableJsonFilePersistence;
///
/// let notes = IdentifiableJsonFilePersistence::<Note>::with_path("./data/notes.json");
/// notes.open().await?;
///
/// notes.create(Note { id: None, content: "hello".into() }).await?;
/// notes.close().await?;
/// ```
#[derive(Debug)]
pub struct IdentifiableJsonFilePersistence<T> {
    persister: Arc<JsonFilePersister<T>>,
    persistence: IdentifiableMemoryPersistence<T>,
}

impl<T> IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    /// Creates an instance with no file path. Configure it before opening.
    pub fn new() -> Self {
        Self::attach(JsonFilePersister::unconfigured(), MemoryPersistence::new())
    }

    /// Creates an instance stored at `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::attach(JsonFilePersister::new(path), MemoryPersistence::new())
    }

    /// Creates an instance from a flat configuration object.
    pub fn from_config(config: &JsonFilePersistenceConfig) -> Self {
        let mut persistence = Self::new();
        persistence.configure(config);

        persistence
    }

    fn attach(persister: JsonFilePersister<T>, mut base: MemoryPersistence<T>) -> Self {
        let persister = Arc::new(persister);

        base.set_loader(Some(persister.clone() as Arc<dyn Loader<T>>));
        base.set_saver(Some(persister.clone() as Arc<dyn Saver<T>>));

        Self {
            persister,
            persistence: IdentifiableMemoryPersistence::from(base),
        }
    }

    /// Returns the attached file persister.
    pub fn persister(&self) -> &JsonFilePersister<T> {
        &self.persister
    }
}

impl<T> Default for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for IdentifiableJsonFilePersistence<T> {
    type Target = IdentifiableMemoryPersistence<T>;

    fn deref(&self) -> &Self::Target {
        &self.persistence
    }
}

impl<T> Configurable for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    type Config = JsonFilePersistenceConfig;

    fn configure(&mut self, config: &JsonFilePersistenceConfig) {
        self.persistence.configure(&config.persistence);

        let mut persister = JsonFilePersister::unconfigured();
        persister.configure(&config.persister);

        debug!(path = ?persister.path(), "Attaching file persister");

        let persister = Arc::new(persister);
        let base = self.persistence.base_mut();
        base.set_loader(Some(persister.clone() as Arc<dyn Loader<T>>));
        base.set_saver(Some(persister.clone() as Arc<dyn Saver<T>>));

        self.persister = persister;
    }
}

#[async_trait]
impl<T> Openable for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    fn is_open(&self) -> bool {
        self.persistence.is_open()
    }

    async fn open(&self) -> StoreResult<()> {
        self.persistence.open().await
    }

    async fn close(&self) -> StoreResult<()> {
        self.persistence.close().await
    }
}

#[async_trait]
impl<T> Cleanable for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn clear(&self) -> StoreResult<()> {
        self.persistence.clear().await
    }
}

#[async_trait]
impl<T> Getter<T> for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn get_one_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        self.persistence.get_one_by_id(id).await
    }

    async fn get_list_by_ids(&self, ids: &[T::Key]) -> StoreResult<Vec<T>> {
        self.persistence.get_list_by_ids(ids).await
    }
}

#[async_trait]
impl<T> Writer<T> for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn create(&self, item: T) -> StoreResult<T> {
        self.persistence.create(item).await
    }

    async fn update(&self, item: T) -> StoreResult<Option<T>> {
        self.persistence.update(item).await
    }

    async fn delete_by_id(&self, id: &T::Key) -> StoreResult<Option<T>> {
        self.persistence.delete_by_id(id).await
    }
}

#[async_trait]
impl<T> Setter<T> for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn set(&self, item: T) -> StoreResult<T> {
        self.persistence.set(item).await
    }
}

#[async_trait]
impl<T> PartialUpdater<T> for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn update_partially(
        &self,
        id: &T::Key,
        fields: &Map<String, Value>,
    ) -> StoreResult<Option<T>> {
        self.persistence.update_partially(id, fields).await
    }
}

#[async_trait]
impl<T> FilteredPager<T> for IdentifiableJsonFilePersistence<T>
where
    T: Identifiable + Serialize + DeserializeOwned,
{
    async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>> {
        self.persistence.get_page_by_filter(filter, paging, sort).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memlayer_core::{error::StoreError, query::Filter, record::IdGenerator};
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Option<String>,
        key: String,
        content: String,
    }

    impl Identifiable for Note {
        type Key = String;

        fn id(&self) -> Option<&String> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    fn note(key: &str, content: &str) -> Note {
        Note {
            id: None,
            key: key.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");

        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(&path);
        notes.open().await.unwrap();
        let first = notes.create(note("K1", "C1")).await.unwrap();
        let second = notes.create(note("K2", "C2")).await.unwrap();
        notes.close().await.unwrap();

        let reopened = IdentifiableJsonFilePersistence::<Note>::with_path(&path);
        reopened.open().await.unwrap();

        let stored = reopened.get_list_by_filter(None, None).await.unwrap();
        assert_eq!(stored, vec![first.clone(), second]);

        let fetched = reopened.get_one_by_id(first.id.as_ref().unwrap()).await.unwrap();
        assert_eq!(fetched, Some(first));
    }

    #[tokio::test]
    async fn every_mutation_reaches_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(&path);
        notes.open().await.unwrap();

        let created = notes.create(note("K1", "C1")).await.unwrap();
        let id = created.id.clone().unwrap();
        let reader = JsonFilePersister::<Note>::new(&path);
        assert_eq!(reader.load().await.unwrap().len(), 1);

        let fields = json!({ "content": "X" }).as_object().cloned().unwrap();
        notes.update_partially(&id, &fields).await.unwrap();
        assert_eq!(reader.load().await.unwrap()[0].content, "X");

        notes.delete_by_id(&id).await.unwrap();
        assert!(reader.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn configure_attaches_the_configured_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configured.json");
        let config = JsonFilePersistenceConfig::from_json(json!({
            "options": { "max_page_size": 1 },
            "path": path,
        }))
        .unwrap();

        let notes = IdentifiableJsonFilePersistence::<Note>::from_config(&config);
        notes.open().await.unwrap();
        notes.create(note("K1", "C1")).await.unwrap();
        notes.create(note("K2", "C2")).await.unwrap();

        assert_eq!(notes.persister().path(), Some(path.as_path()));
        assert_eq!(notes.get_page_by_filter(None, None, None).await.unwrap().len(), 1);
        assert_eq!(JsonFilePersister::<Note>::new(&path).load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn open_without_path_fails_and_stays_closed() {
        let notes = IdentifiableJsonFilePersistence::<Note>::new();

        let err = notes.open().await.unwrap_err();

        assert!(matches!(err, StoreError::Configuration(_)));
        assert!(!notes.is_open());
    }

    #[tokio::test]
    async fn corrupt_file_keeps_instance_closed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[{").unwrap();

        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(&path);

        assert!(matches!(notes.open().await, Err(StoreError::Read { .. })));
        assert!(!Openable::is_open(&notes));
    }

    #[tokio::test]
    async fn clear_empties_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(&path);
        notes.open().await.unwrap();
        notes.create(note("K1", "C1")).await.unwrap();

        Cleanable::clear(&notes).await.unwrap();

        assert!(JsonFilePersister::<Note>::new(&path).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filtered_delete_persists_survivors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(&path);
        notes.open().await.unwrap();
        for key in ["A", "B", "A"] {
            notes.create(note(key, "C")).await.unwrap();
        }

        let removed = notes
            .delete_by_filter(&Filter::new(|n: &Note| n.key == "A"))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        let stored = JsonFilePersister::<Note>::new(&path).load().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, "B");
    }

    #[tokio::test]
    async fn explicit_ids_are_kept() {
        let dir = TempDir::new().unwrap();
        let notes = IdentifiableJsonFilePersistence::<Note>::with_path(dir.path().join("n.json"));
        notes.open().await.unwrap();

        let id = String::next_id();
        let created = notes
            .create(Note { id: Some(id.clone()), ..note("K1", "C1") })
            .await
            .unwrap();

        assert_eq!(created.id, Some(id));
    }
}

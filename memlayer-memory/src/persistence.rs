//! In-memory collection engine.
//!
//! This module provides [`MemoryPersistence`], which owns an ordered list of records
//! and implements filtering, sorting, paging, counting and random sampling over it.
//! Durability is delegated to an optional [`Loader`] (used on open) and an optional
//! [`Saver`] (used after every mutation and on close).

use async_trait::async_trait;
use mea::rwlock::RwLock;
use rand::Rng;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{debug, trace, warn};

use memlayer_core::{
    backend::{Loader, Saver},
    config::{DEFAULT_MAX_PAGE_SIZE, MemoryPersistenceConfig},
    crud::FilteredPager,
    error::StoreResult,
    lifecycle::{Cleanable, Configurable, Openable},
    page::{Page, PagingParams},
    query::{Filter, Sort},
};

/// In-memory persistence for a homogeneous collection of records.
///
/// The working set is an ordered list: records keep their insertion order and
/// nothing but the mutating operations of this type (and of the identity layer
/// built on it) changes it. Every record handed in or out is a copy, so callers
/// never hold a reference into the working set.
///
/// # Concurrency
///
/// The working set sits behind an async read-write lock. Mutating operations keep
/// the write lock until their save has completed, so saves issued through one
/// instance reach the [`Saver`] one at a time and in order.
///
/// # Example
///
/// ```ignore
/// use memlayer::memory::MemoryPersistence;
/// use memlayer::query::{Filter, Sort};
///
/// let persistence = MemoryPersistence::<u32>::builder().with_max_page_size(10).build();
/// persistence.open().await?;
///
/// persistence.create(3).await?;
/// persistence.create(8).await?;
///
/// let even = Filter::new(|n: &u32| n % 2 == 0);
/// let list = persistence.get_list_by_filter(Some(&even), Some(&Sort::by_key(|n: &u32| *n))).await?;
/// assert_eq!(list, vec![8]);
/// ```
pub struct MemoryPersistence<T> {
    pub(crate) items: RwLock<Vec<T>>,
    opened: AtomicBool,
    max_page_size: usize,
    loader: Option<Arc<dyn Loader<T>>>,
    saver: Option<Arc<dyn Saver<T>>>,
}

impl<T> MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a transient persistence with no loader and no saver.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            opened: AtomicBool::new(false),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            loader: None,
            saver: None,
        }
    }

    /// Creates a builder for attaching a loader, a saver and options.
    pub fn builder() -> MemoryPersistenceBuilder<T> {
        MemoryPersistenceBuilder::default()
    }

    /// Returns the page size used when a caller does not bound a page.
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Replaces the attached loader.
    pub fn set_loader(&mut self, loader: Option<Arc<dyn Loader<T>>>) {
        self.loader = loader;
    }

    /// Replaces the attached saver.
    pub fn set_saver(&mut self, saver: Option<Arc<dyn Saver<T>>>) {
        self.saver = saver;
    }

    /// Returns `true` while the persistence is open.
    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Opens the persistence, replacing the working set with the loader's records.
    ///
    /// Without a loader the working set is left as it is.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. A failed load leaves the persistence closed and
    /// the working set untouched.
    pub async fn open(&self) -> StoreResult<()> {
        if let Some(loader) = &self.loader {
            let loaded = loader
                .load()
                .await
                .inspect_err(|e| warn!(error = %e, "Failed to load items"))?;

            let count = loaded.len();
            *self.items.write().await = loaded;

            debug!(count, "Loaded items");
        }

        self.opened.store(true, Ordering::Release);

        Ok(())
    }

    /// Saves the working set and closes the persistence.
    ///
    /// # Errors
    ///
    /// Returns the saver's error. The persistence is closed either way.
    pub async fn close(&self) -> StoreResult<()> {
        let result = self.save().await;
        self.opened.store(false, Ordering::Release);

        debug!("Closed persistence");

        result
    }

    /// Passes the whole working set to the saver. Succeeds trivially without one.
    pub async fn save(&self) -> StoreResult<()> {
        let items = self.items.read().await;
        self.save_items(&items).await
    }

    pub(crate) async fn save_items(&self, items: &[T]) -> StoreResult<()> {
        let Some(saver) = &self.saver else {
            return Ok(());
        };

        saver
            .save(items)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to save items"))?;

        trace!(count = items.len(), "Saved items");

        Ok(())
    }

    /// Removes every record, then saves.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut items = self.items.write().await;
        items.clear();

        trace!("Cleared items");

        self.save_items(&items).await
    }

    /// Returns one page of the filtered, sorted working set.
    ///
    /// `skip` defaults to none and `take` defaults to (and is capped at) the
    /// configured maximum page size. When a total is requested it counts the
    /// filtered records before paging.
    pub async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>> {
        let items = self.items.read().await;
        let selected = select(&items, filter, sort);

        let paging = paging.cloned().unwrap_or_default();
        let skip = usize::try_from(paging.skip(-1)).unwrap_or(0);
        let take = paging.take(self.max_page_size);
        let total = paging.has_total().then_some(selected.len());

        let page: Vec<T> = selected
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();

        trace!(count = page.len(), total = ?total, "Retrieved page of items");

        Ok(Page::builder(page).with_total(total).build())
    }

    /// Returns the number of records matching `filter`.
    pub async fn get_count_by_filter(&self, filter: Option<&Filter<T>>) -> StoreResult<usize> {
        let items = self.items.read().await;
        let count = match filter {
            Some(filter) => items.iter().filter(|item| filter.matches(item)).count(),
            None => items.len(),
        };

        trace!(count, "Counted items");

        Ok(count)
    }

    /// Returns every record matching `filter`, sorted by `sort`. No paging is applied.
    pub async fn get_list_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Vec<T>> {
        let items = self.items.read().await;
        let list: Vec<T> = select(&items, filter, sort)
            .into_iter()
            .cloned()
            .collect();

        trace!(count = list.len(), "Retrieved list of items");

        Ok(list)
    }

    /// Returns a uniformly chosen record matching `filter`, or `None` if nothing matches.
    pub async fn get_one_random(&self, filter: Option<&Filter<T>>) -> StoreResult<Option<T>> {
        let items = self.items.read().await;
        let selected = select(&items, filter, None);

        if selected.is_empty() {
            trace!("Random item wasn't found");
            return Ok(None);
        }

        let index = rand::thread_rng().gen_range(0..selected.len());

        trace!(index, "Retrieved random item");

        Ok(Some(selected[index].clone()))
    }

    /// Appends a copy of `item` to the working set, saves, and returns `item`.
    pub async fn create(&self, item: T) -> StoreResult<T> {
        let mut items = self.items.write().await;
        items.push(item.clone());

        trace!(count = items.len(), "Created item");

        self.save_items(&items).await?;

        Ok(item)
    }

    /// Removes every record matching `filter` and returns how many were removed.
    ///
    /// The working set is only saved when at least one record was removed.
    pub async fn delete_by_filter(&self, filter: &Filter<T>) -> StoreResult<usize> {
        let mut items = self.items.write().await;
        let before = items.len();

        items.retain(|item| !filter.matches(item));

        let deleted = before - items.len();

        trace!(deleted, "Deleted items by filter");

        if deleted > 0 {
            self.save_items(&items).await?;
        }

        Ok(deleted)
    }
}

/// Filters then stable-sorts `items`, borrowing rather than cloning.
pub(crate) fn select<'a, T>(
    items: &'a [T],
    filter: Option<&Filter<T>>,
    sort: Option<&Sort<T>>,
) -> Vec<&'a T> {
    let mut selected: Vec<&T> = match filter {
        Some(filter) => items.iter().filter(|item| filter.matches(item)).collect(),
        None => items.iter().collect(),
    };

    if let Some(sort) = sort {
        selected.sort_by(|a, b| sort.compare(a, b));
    }

    selected
}

impl<T> Default for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MemoryPersistence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPersistence")
            .field("opened", &self.opened.load(Ordering::Relaxed))
            .field("max_page_size", &self.max_page_size)
            .field("loader", &self.loader)
            .field("saver", &self.saver)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> Openable for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn is_open(&self) -> bool {
        MemoryPersistence::is_open(self)
    }

    async fn open(&self) -> StoreResult<()> {
        MemoryPersistence::open(self).await
    }

    async fn close(&self) -> StoreResult<()> {
        MemoryPersistence::close(self).await
    }
}

#[async_trait]
impl<T> Cleanable for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn clear(&self) -> StoreResult<()> {
        MemoryPersistence::clear(self).await
    }
}

#[async_trait]
impl<T> FilteredPager<T> for MemoryPersistence<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get_page_by_filter(
        &self,
        filter: Option<&Filter<T>>,
        paging: Option<&PagingParams>,
        sort: Option<&Sort<T>>,
    ) -> StoreResult<Page<T>> {
        MemoryPersistence::get_page_by_filter(self, filter, paging, sort).await
    }
}

impl<T> Configurable for MemoryPersistence<T> {
    type Config = MemoryPersistenceConfig;

    fn configure(&mut self, config: &MemoryPersistenceConfig) {
        self.max_page_size = config.options.max_page_size;
    }
}

/// Builder for constructing [`MemoryPersistence`] instances.
///
/// # Example
///
/// ```ignore
/// let persistence = MemoryPersistence::builder()
///     .with_loader(fixtures)
///     .with_saver(sink)
///     .with_max_page_size(25)
///     .build();
/// ```
pub struct MemoryPersistenceBuilder<T> {
    loader: Option<Arc<dyn Loader<T>>>,
    saver: Option<Arc<dyn Saver<T>>>,
    config: MemoryPersistenceConfig,
}

impl<T> Default for MemoryPersistenceBuilder<T> {
    fn default() -> Self {
        Self {
            loader: None,
            saver: None,
            config: MemoryPersistenceConfig::default(),
        }
    }
}

impl<T> MemoryPersistenceBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Attaches the loader used by `open`.
    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: Loader<T> + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Attaches the saver used after mutations and by `close`.
    pub fn with_saver<S>(mut self, saver: S) -> Self
    where
        S: Saver<T> + 'static,
    {
        self.saver = Some(Arc::new(saver));
        self
    }

    /// Sets the page size used when a caller does not bound a page.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.config.options.max_page_size = max_page_size;
        self
    }

    /// Applies a full configuration.
    pub fn with_config(mut self, config: MemoryPersistenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds and returns the [`MemoryPersistence`].
    pub fn build(self) -> MemoryPersistence<T> {
        let mut persistence = MemoryPersistence::new();
        persistence.configure(&self.config);
        persistence.loader = self.loader;
        persistence.saver = self.saver;

        persistence
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use memlayer_core::error::StoreError;
    use std::sync::{
        Mutex,
        atomic::AtomicUsize,
    };

    /// Saver that records every saved snapshot and can be told to fail.
    #[derive(Debug)]
    pub(crate) struct RecordingSaver<T> {
        pub(crate) snapshots: Mutex<Vec<Vec<T>>>,
        pub(crate) fail: AtomicBool,
    }

    impl<T> Default for RecordingSaver<T> {
        fn default() -> Self {
            Self {
                snapshots: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }
    }

    impl<T: Clone> RecordingSaver<T> {
        pub(crate) fn saves(&self) -> usize {
            self.snapshots.lock().unwrap().len()
        }

        pub(crate) fn last(&self) -> Option<Vec<T>> {
            self.snapshots.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl<T> Saver<T> for RecordingSaver<T>
    where
        T: Clone + Send + Sync + fmt::Debug,
    {
        async fn save(&self, items: &[T]) -> StoreResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("disk full".into()));
            }

            self.snapshots.lock().unwrap().push(items.to_vec());

            Ok(())
        }
    }

    /// Loader returning a fixed list, or failing when constructed with `None`.
    #[derive(Debug)]
    pub(crate) struct FixtureLoader<T> {
        pub(crate) items: Option<Vec<T>>,
        pub(crate) calls: AtomicUsize,
    }

    impl<T> FixtureLoader<T> {
        pub(crate) fn new(items: Option<Vec<T>>) -> Self {
            Self {
                items,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<T> Loader<T> for FixtureLoader<T>
    where
        T: Clone + Send + Sync + fmt::Debug,
    {
        async fn load(&self) -> StoreResult<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            self.items
                .clone()
                .ok_or_else(|| StoreError::Backend("fixture unavailable".into()))
        }
    }

    async fn numbers(values: &[u32]) -> MemoryPersistence<u32> {
        let persistence = MemoryPersistence::new();
        for value in values {
            persistence.create(*value).await.unwrap();
        }

        persistence
    }

    #[tokio::test]
    async fn open_replaces_working_set_from_loader() {
        let loader = Arc::new(FixtureLoader::new(Some(vec![1u32, 2, 3])));
        let persistence = MemoryPersistence::builder().with_loader(loader.clone()).build();

        persistence.create(99).await.unwrap();
        persistence.open().await.unwrap();

        assert!(persistence.is_open());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(persistence.get_list_by_filter(None, None).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_load_leaves_persistence_closed() {
        let persistence = MemoryPersistence::<u32>::builder()
            .with_loader(FixtureLoader::new(None))
            .build();

        let result = persistence.open().await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(!persistence.is_open());
        assert_eq!(persistence.get_count_by_filter(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn close_surfaces_save_error_but_still_closes() {
        let saver = Arc::new(RecordingSaver::<u32>::default());
        let persistence = MemoryPersistence::builder().with_saver(saver.clone()).build();
        persistence.open().await.unwrap();

        saver.fail.store(true, Ordering::SeqCst);
        let result = persistence.close().await;

        assert!(result.is_err());
        assert!(!persistence.is_open());
    }

    #[tokio::test]
    async fn save_without_saver_succeeds() {
        let persistence = numbers(&[1, 2]).await;

        assert!(persistence.save().await.is_ok());
        assert!(persistence.close().await.is_ok());
    }

    #[tokio::test]
    async fn create_appends_and_saves() {
        let saver = Arc::new(RecordingSaver::<u32>::default());
        let persistence = MemoryPersistence::builder().with_saver(saver.clone()).build();

        persistence.create(5).await.unwrap();
        persistence.create(7).await.unwrap();

        assert_eq!(saver.saves(), 2);
        assert_eq!(saver.last(), Some(vec![5, 7]));
    }

    #[tokio::test]
    async fn failed_save_keeps_in_memory_change() {
        let saver = Arc::new(RecordingSaver::<u32>::default());
        saver.fail.store(true, Ordering::SeqCst);
        let persistence = MemoryPersistence::builder().with_saver(saver.clone()).build();

        assert!(persistence.create(5).await.is_err());
        assert_eq!(persistence.get_list_by_filter(None, None).await.unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn page_counts_filtered_total() {
        let persistence = numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).await;
        let even = Filter::new(|n: &u32| n % 2 == 0);
        let paging = PagingParams::builder().with_skip(1).with_take(2).with_total(true).build();

        let page = persistence
            .get_page_by_filter(Some(&even), Some(&paging), None)
            .await
            .unwrap();

        assert_eq!(page.items, vec![4, 6]);
        assert_eq!(page.total, Some(5));
    }

    #[tokio::test]
    async fn page_size_follows_skip_and_take() {
        let persistence = numbers(&[1, 2, 3, 4, 5, 6, 7]).await;

        for (skip, take) in [(0, 3), (5, 3), (7, 2), (9, 1), (2, 0)] {
            let paging = PagingParams::new(Some(skip), Some(take), true);
            let page = persistence.get_page_by_filter(None, Some(&paging), None).await.unwrap();

            let expected = (take as usize).min(7usize.saturating_sub(skip as usize));
            assert_eq!(page.len(), expected, "skip={skip} take={take}");
            assert_eq!(page.total, Some(7));
        }
    }

    #[tokio::test]
    async fn unbounded_page_uses_max_page_size() {
        let mut persistence = numbers(&[1, 2, 3, 4, 5]).await;
        persistence.configure(&MemoryPersistenceConfig::from_json(serde_json::json!({
            "options": { "max_page_size": 3 }
        })).unwrap());

        let page = persistence.get_page_by_filter(None, None, None).await.unwrap();

        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, None);
    }

    #[tokio::test]
    async fn page_sorts_before_slicing_without_mutating() {
        let persistence = numbers(&[3, 1, 2]).await;
        let paging = PagingParams::builder().with_take(2).build();

        let page = persistence
            .get_page_by_filter(None, Some(&paging), Some(&Sort::by_key_desc(|n: &u32| *n)))
            .await
            .unwrap();

        assert_eq!(page.items, vec![3, 2]);
        assert_eq!(persistence.get_list_by_filter(None, None).await.unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn descending_sort_keeps_ties_in_order() {
        let persistence = MemoryPersistence::new();
        for pair in [(1u32, 'a'), (3, 'b'), (1, 'c'), (3, 'd'), (2, 'e')] {
            persistence.create(pair).await.unwrap();
        }

        let list = persistence
            .get_list_by_filter(None, Some(&Sort::by_key_desc(|p: &(u32, char)| p.0)))
            .await
            .unwrap();

        let labels: String = list.iter().map(|p| p.1).collect();
        assert_eq!(labels, "bdeac");
    }

    #[tokio::test]
    async fn count_ignores_paging() {
        let persistence = numbers(&[1, 2, 3, 4]).await;
        let big = Filter::new(|n: &u32| *n > 2);

        assert_eq!(persistence.get_count_by_filter(Some(&big)).await.unwrap(), 2);
        assert_eq!(persistence.get_count_by_filter(None).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn random_pick_respects_filter() {
        let persistence = numbers(&[1, 2, 3, 4]).await;
        let odd = Filter::new(|n: &u32| n % 2 == 1);
        let none = Filter::new(|_: &u32| false);

        for _ in 0..20 {
            let pick = persistence.get_one_random(Some(&odd)).await.unwrap();
            assert!(matches!(pick, Some(1) | Some(3)));
        }
        assert_eq!(persistence.get_one_random(Some(&none)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_by_filter_saves_only_when_something_was_removed() {
        let saver = Arc::new(RecordingSaver::<u32>::default());
        let persistence = MemoryPersistence::builder().with_saver(saver.clone()).build();
        for value in [1, 2, 3, 4] {
            persistence.create(value).await.unwrap();
        }

        let deleted = persistence
            .delete_by_filter(&Filter::new(|n: &u32| *n > 10))
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(saver.saves(), 4);

        let deleted = persistence
            .delete_by_filter(&Filter::new(|n: &u32| n % 2 == 0))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(saver.saves(), 5);
        assert_eq!(saver.last(), Some(vec![1, 3]));
    }

    #[tokio::test]
    async fn clear_empties_and_saves() {
        let saver = Arc::new(RecordingSaver::<u32>::default());
        let persistence = MemoryPersistence::builder().with_saver(saver.clone()).build();
        persistence.create(1).await.unwrap();

        persistence.clear().await.unwrap();

        assert_eq!(persistence.get_count_by_filter(None).await.unwrap(), 0);
        assert_eq!(saver.last(), Some(vec![]));
    }

    #[tokio::test]
    async fn usable_through_lifecycle_traits() {
        let persistence = numbers(&[1]).await;
        let openable: &dyn Openable = &persistence;

        openable.open().await.unwrap();
        assert!(openable.is_open());

        Cleanable::clear(&persistence).await.unwrap();
        openable.close().await.unwrap();

        assert!(!openable.is_open());
        assert_eq!(persistence.get_count_by_filter(None).await.unwrap(), 0);
    }
}

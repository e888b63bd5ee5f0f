//! Paging types for slicing query results.
//!
//! This module provides the [`Page`] struct returned by paged reads and
//! [`PagingParams`] for specifying which slice of the result set to return.

use serde::{Deserialize, Serialize};

/// A single page of results.
///
/// A page is a materialized slice of a (filtered, sorted) record list. It is
/// never persisted and is recomputed on each call.
///
/// # Example
///
/// ```ignore
/// use memlayer::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_total(Some(100))
///     .build();
///
/// assert_eq!(page.items.len(), 1);
/// assert_eq!(page.total, Some(100));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Number of items matching the filter before paging, when it was requested.
    pub total: Option<usize>,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }
}

/// Builder for constructing [`Page`] instances with fluent API.
pub struct PageBuilder<T> {
    items: Vec<T>,
    total: Option<usize>,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    /// Sets the total count of matching items.
    pub fn with_total(mut self, total: Option<usize>) -> Self {
        self.total = total;
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            total: self.total,
        }
    }
}

/// Parameters describing which slice of a result set to return.
///
/// `skip` and `take` are signed so that values coming from loosely typed
/// callers keep their meaning: a negative `skip` means "no skip" and a
/// negative `take` means "nothing".
///
/// # Example
///
/// ```ignore
/// use memlayer::page::PagingParams;
///
/// let params = PagingParams::builder().with_skip(20).with_take(10).with_total(true).build();
///
/// assert_eq!(params.skip(0), 20);
/// assert_eq!(params.take(100), 10);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PagingParams {
    /// Number of items to skip.
    #[serde(default)]
    pub skip: Option<i64>,
    /// Maximum number of items to return.
    #[serde(default)]
    pub take: Option<i64>,
    /// Whether the total number of matching items should be computed.
    #[serde(default)]
    pub total: bool,
}

impl PagingParams {
    /// Creates new paging parameters.
    pub fn new(skip: Option<i64>, take: Option<i64>, total: bool) -> Self {
        Self { skip, take, total }
    }

    /// Creates a new builder for constructing paging parameters.
    pub fn builder() -> PagingParamsBuilder {
        PagingParamsBuilder::new()
    }

    /// Returns the number of items to skip, never less than `min_skip`.
    ///
    /// An unset skip resolves to `min_skip`.
    pub fn skip(&self, min_skip: i64) -> i64 {
        match self.skip {
            Some(skip) if skip > min_skip => skip,
            _ => min_skip,
        }
    }

    /// Returns the number of items to take, capped at `max_take`.
    ///
    /// An unset take resolves to `max_take`; a negative take resolves to 0.
    pub fn take(&self, max_take: usize) -> usize {
        match self.take {
            None => max_take,
            Some(take) if take < 0 => 0,
            Some(take) => (take as u64).min(max_take as u64) as usize,
        }
    }

    /// Returns `true` if the total count was requested.
    pub fn has_total(&self) -> bool {
        self.total
    }
}

/// Builder for constructing [`PagingParams`] instances.
#[derive(Default)]
pub struct PagingParamsBuilder {
    skip: Option<i64>,
    take: Option<i64>,
    total: bool,
}

impl PagingParamsBuilder {
    /// Creates a new builder with no parameters set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of items to skip.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of items to return.
    pub fn with_take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Requests the total count of matching items.
    pub fn with_total(mut self, total: bool) -> Self {
        self.total = total;
        self
    }

    /// Builds and returns the [`PagingParams`].
    pub fn build(self) -> PagingParams {
        PagingParams {
            skip: self.skip,
            take: self.take,
            total: self.total,
        }
    }
}

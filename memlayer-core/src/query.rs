//! Filter and sort strategies applied to a record list.
//!
//! Persistence components treat filters and sorts as opaque values supplied by the
//! caller. A [`Filter`] is a predicate over a record and a [`Sort`] is a comparator,
//! usually derived from a key function.
//!
//! # Example
//!
//! ```ignore
//! use memlayer::query::{Filter, Sort};
//!
//! let active = Filter::new(|user: &User| user.active);
//! let adults = Filter::new(|user: &User| user.age >= 18);
//!
//! let filter = active.and(adults);
//! let sort = Sort::by_key_desc(|user: &User| user.age).then(Sort::by_key(|user: &User| user.name.clone()));
//! ```

use std::{cmp::Ordering, fmt, sync::Arc};

type Predicate<T> = dyn Fn(&T) -> bool + Send + Sync;
type Comparator<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

/// A predicate selecting records.
///
/// Filters are cheap to clone and can be combined with [`Filter::and`],
/// [`Filter::or`] and [`Filter::not`].
pub struct Filter<T> {
    predicate: Arc<Predicate<T>>,
}

impl<T> Filter<T> {
    /// Creates a filter from a predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Returns `true` if `item` satisfies this filter.
    pub fn matches(&self, item: &T) -> bool {
        (self.predicate)(item)
    }
}

impl<T: 'static> Filter<T> {
    /// Matches when both filters match.
    pub fn and(self, other: Filter<T>) -> Self {
        Filter::new(move |item| self.matches(item) && other.matches(item))
    }

    /// Matches when either filter matches.
    pub fn or(self, other: Filter<T>) -> Self {
        Filter::new(move |item| self.matches(item) || other.matches(item))
    }

    /// Inverts this filter.
    pub fn not(self) -> Self {
        Filter::new(move |item| !self.matches(item))
    }

    /// Matches when every filter matches. An empty list matches everything.
    pub fn all(filters: Vec<Filter<T>>) -> Self {
        Filter::new(move |item| filters.iter().all(|f| f.matches(item)))
    }

    /// Matches when any filter matches. An empty list matches nothing.
    pub fn any(filters: Vec<Filter<T>>) -> Self {
        Filter::new(move |item| filters.iter().any(|f| f.matches(item)))
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// Sort direction for key-based sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9).
    Asc,
    /// Descending order (Z to A, 9 to 0).
    Desc,
}

/// An ordering over records.
///
/// Sorting with a [`Sort`] is always stable: records comparing equal keep their
/// relative order.
pub struct Sort<T> {
    comparator: Arc<Comparator<T>>,
}

impl<T> Sort<T> {
    /// Creates a sort from a comparator function.
    pub fn new<F>(comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            comparator: Arc::new(comparator),
        }
    }

    /// Sorts by a key extracted from each record, in the given direction.
    ///
    /// Keys that cannot be ordered against each other (such as `NaN`) compare as equal.
    pub fn by<K, F>(key: F, direction: SortDirection) -> Self
    where
        K: PartialOrd,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Sort::new(move |a, b| {
            let ordering = key(a)
                .partial_cmp(&key(b))
                .unwrap_or(Ordering::Equal);

            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
    }

    /// Sorts ascending by a key extracted from each record.
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: PartialOrd,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Sort::by(key, SortDirection::Asc)
    }

    /// Sorts descending by a key extracted from each record.
    pub fn by_key_desc<K, F>(key: F) -> Self
    where
        K: PartialOrd,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Sort::by(key, SortDirection::Desc)
    }

    /// Compares two records.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.comparator)(a, b)
    }

    /// Stable-sorts `items` in place.
    pub fn apply(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl<T: 'static> Sort<T> {
    /// Reverses this ordering.
    pub fn reverse(self) -> Self {
        Sort::new(move |a, b| self.compare(a, b).reverse())
    }

    /// Breaks ties of this ordering with `next`.
    pub fn then(self, next: Sort<T>) -> Self {
        Sort::new(move |a, b| self.compare(a, b).then_with(|| next.compare(a, b)))
    }
}

impl<T> Clone for Sort<T> {
    fn clone(&self) -> Self {
        Self {
            comparator: Arc::clone(&self.comparator),
        }
    }
}

impl<T> fmt::Debug for Sort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sort").finish_non_exhaustive()
    }
}

//! Durable backend contracts for persistence components.
//!
//! A persistence component keeps its records in memory and delegates durability to
//! two collaborators:
//!
//! - [`Loader`]: produces the full record list when the component is opened
//! - [`Saver`]: receives the full record list after every mutation and on close
//!
//! Either may be absent, in which case the component is purely transient. A single
//! type may implement both (see the JSON file persister).
//!
//! # Examples
//!
//! ```ignore
//! use memlayer::backend::{Loader, Saver};
//! use memlayer::error::StoreResult;
//!
//! #[derive(Debug)]
//! struct Fixture(Vec<Note>);
//!
//! #[async_trait::async_trait]
//! impl Loader<Note> for Fixture {
//!     async fn load(&self) -> StoreResult<Vec<Note>> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::error::StoreResult;

/// Produces the entire record list from a durable backend.
///
/// # Error Handling
///
/// A failure is returned unchanged to the operation that triggered the load.
#[async_trait]
pub trait Loader<T>: Send + Sync + Debug {
    /// Fetches every stored record.
    async fn load(&self) -> StoreResult<Vec<T>>;
}

/// Accepts the entire record list for durable storage.
///
/// # Error Handling
///
/// A failure is returned unchanged to the operation that triggered the save. The
/// in-memory change that preceded the save is not rolled back.
#[async_trait]
pub trait Saver<T>: Send + Sync + Debug {
    /// Replaces the stored records with `items`.
    async fn save(&self, items: &[T]) -> StoreResult<()>;
}

#[async_trait]
impl<T, L> Loader<T> for &L
where
    T: 'static,
    L: Loader<T> + ?Sized,
{
    async fn load(&self) -> StoreResult<Vec<T>> {
        (**self).load().await
    }
}

#[async_trait]
impl<T, L> Loader<T> for Arc<L>
where
    T: 'static,
    L: Loader<T> + ?Sized,
{
    async fn load(&self) -> StoreResult<Vec<T>> {
        (**self).load().await
    }
}

#[async_trait]
impl<T, S> Saver<T> for &S
where
    T: Sync + 'static,
    S: Saver<T> + ?Sized,
{
    async fn save(&self, items: &[T]) -> StoreResult<()> {
        (**self).save(items).await
    }
}

#[async_trait]
impl<T, S> Saver<T> for Arc<S>
where
    T: Sync + 'static,
    S: Saver<T> + ?Sized,
{
    async fn save(&self, items: &[T]) -> StoreResult<()> {
        (**self).save(items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        saved: Mutex<Vec<Vec<u32>>>,
    }

    #[async_trait]
    impl Loader<u32> for Recorder {
        async fn load(&self) -> StoreResult<Vec<u32>> {
            Ok(self.saved.lock().unwrap().last().cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl Saver<u32> for Recorder {
        async fn save(&self, items: &[u32]) -> StoreResult<()> {
            self.saved.lock().unwrap().push(items.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn shared_handles_forward_to_the_same_backend() {
        let recorder = Arc::new(Recorder::default());
        let saver: Arc<dyn Saver<u32>> = recorder.clone();
        let loader: Arc<dyn Loader<u32>> = recorder.clone();

        saver.save(&[1, 2, 3]).await.unwrap();

        assert_eq!(loader.load().await.unwrap(), vec![1, 2, 3]);
        assert_eq!((&*recorder).load().await.unwrap(), vec![1, 2, 3]);
    }
}

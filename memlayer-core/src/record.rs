//! Core traits for records held by a persistence component.
//!
//! The base persistence layer accepts any `Clone + Send + Sync` value. The identity
//! layer additionally needs records to expose a mutable identifier, described by
//! [`Identifiable`], and identifiers that can be generated, described by [`IdGenerator`].

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};
use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Trait for records that carry a unique identifier.
///
/// The identifier is optional: a record without one gets a freshly generated
/// identifier when it is created or set through the identity layer.
///
/// # Deriving
///
/// `Identifiable` can be derived for structs with an `id: Option<K>` field, or with
/// any `Option<K>` field marked `#[id]`:
///
/// ```ignore
/// use memlayer::prelude::*;
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Identifiable)]
/// pub struct Note {
///     pub id: Option<String>,
///     pub key: String,
///     pub content: String,
/// }
/// ```
///
/// # Example
///
/// ```ignore
/// impl Identifiable for Note {
///     type Key = String;
///
///     fn id(&self) -> Option<&String> {
///         self.id.as_ref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
/// }
/// ```
pub trait Identifiable: Clone + Send + Sync + 'static {
    /// The identifier type. Compared only for equality.
    type Key: IdGenerator + Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Returns this record's identifier, if it has one.
    fn id(&self) -> Option<&Self::Key>;

    /// Sets this record's identifier.
    fn set_id(&mut self, id: Self::Key);

    /// Returns `true` if this record's identifier equals `id`.
    fn has_id(&self, id: &Self::Key) -> bool {
        self.id() == Some(id)
    }
}

/// Generates identifiers for records stored without one.
///
/// Generators only promise uniqueness among the identifiers they produced themselves.
/// Identifiers loaded from a backend may collide with them; call [`reserve`] on those so
/// later identifiers skip past them.
///
/// [`reserve`]: IdGenerator::reserve
pub trait IdGenerator: Sized {
    /// Produces a new identifier.
    fn next_id() -> Self;

    /// Marks an existing identifier as taken.
    fn reserve(&self) {}
}

/// A random 32 character hexadecimal identifier.
impl IdGenerator for String {
    fn next_id() -> Self {
        Uuid::new_v4().simple().to_string()
    }
}

impl IdGenerator for Uuid {
    fn next_id() -> Self {
        Uuid::new_v4()
    }
}

static NEXT_NUMERIC_ID: AtomicU64 = AtomicU64::new(1);

/// Numeric identifiers come from a process-wide monotonic counter starting at 1.
/// Reserving an identifier moves the counter past it.
impl IdGenerator for u64 {
    fn next_id() -> Self {
        NEXT_NUMERIC_ID.fetch_add(1, Ordering::Relaxed)
    }

    fn reserve(&self) {
        NEXT_NUMERIC_ID.fetch_max(self.saturating_add(1), Ordering::Relaxed);
    }
}

impl IdGenerator for i64 {
    fn next_id() -> Self {
        NEXT_NUMERIC_ID.fetch_add(1, Ordering::Relaxed) as i64
    }

    fn reserve(&self) {
        if let Ok(id) = u64::try_from(*self) {
            id.reserve();
        }
    }
}

/// Extension trait providing JSON conversion utilities for records.
///
/// This trait is automatically implemented for all serializable records.
pub trait RecordExt: Serialize + DeserializeOwned {
    /// Converts this record to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> StoreResult<Value>;

    /// Creates a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> StoreResult<Self>;

    /// Returns a copy of this record with every entry of `fields` written over the
    /// corresponding field. Fields not named in `fields` are left untouched.
    ///
    /// The merge goes through the record's JSON form, so only fields that survive a
    /// serialize/deserialize round trip are preserved. A field marked
    /// `#[serde(skip)]` (or skipped when serializing) comes back as its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object, or if the
    /// merged object no longer deserializes into the record type.
    fn merge_fields(&self, fields: &Map<String, Value>) -> StoreResult<Self>;
}

impl<R: Serialize + DeserializeOwned> RecordExt for R {
    fn to_json(&self) -> StoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(from_value(value)?)
    }

    fn merge_fields(&self, fields: &Map<String, Value>) -> StoreResult<Self> {
        let mut object = match self.to_json()? {
            Value::Object(object) => object,
            other => {
                return Err(StoreError::Serialization(format!(
                    "Expected record to serialize to an object, got {other}"
                )));
            }
        };

        for (field, value) in fields {
            object.insert(field.clone(), value.clone());
        }

        Self::from_json(Value::Object(object))
    }
}

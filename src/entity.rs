//! Marker trait for structured (JSON-encoded) cache values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Trait that structured values stored in a cache repository implement.
///
/// Implementing it opts a type into JSON storage; the encode/decode logic
/// comes from the blanket [`CacheValue`](crate::CacheValue) impl and is not
/// overridable, so every structured entry uses the same wire form.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use cache_repository::CacheEntity;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Employment {
///     pub id: String,
///     pub employer_name: String,
/// }
///
/// impl CacheEntity for Employment {}
/// ```
pub trait CacheEntity: Serialize + DeserializeOwned + Send + Sync {}

impl CacheEntity for serde_json::Value {}

impl<T: CacheEntity> CacheEntity for Vec<T> {}

impl<T: CacheEntity> CacheEntity for HashMap<String, T> {}

impl<T: CacheEntity> CacheEntity for BTreeMap<String, T> {}

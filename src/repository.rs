//! Typed cache repositories over a [`KeyValueStore`].
//!
//! [`BaseRepository`] holds the store handle, the bound [`Context`] and the
//! [`ValueKind`] of `V`, and implements every operation. Concrete
//! repositories customise behaviour through the [`CacheRepository`] trait:
//! they hand out their inner `BaseRepository` from `base()` and override only
//! the methods they need. Generic code written against `CacheRepository`
//! reaches the overrides and falls back to the base for everything else.
//!
//! ```
//! use cache_repository::{BaseRepository, CacheRepository, Context, InMemoryStore, Result};
//!
//! /// Prefixes every scalar key with a tenant id.
//! struct TenantRepository {
//!     tenant: String,
//!     base: BaseRepository<String, InMemoryStore>,
//! }
//!
//! impl CacheRepository for TenantRepository {
//!     type Value = String;
//!     type Store = InMemoryStore;
//!
//!     fn base(&self) -> &BaseRepository<String, InMemoryStore> {
//!         &self.base
//!     }
//!
//!     async fn get(&self, key: &str) -> Result<Option<String>> {
//!         self.base.get(&format!("{}:{}", self.tenant, key)).await
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let store = InMemoryStore::new();
//! let repo = TenantRepository {
//!     tenant: "acme".to_string(),
//!     base: BaseRepository::new(store, Context::background()),
//! };
//!
//! repo.base().set("acme:greeting", &"hello".to_string(), None).await?;
//! assert_eq!(repo.get("greeting").await?, Some("hello".to_string()));
//! assert!(repo.exists("acme:greeting").await?); // inherited
//! # Ok(())
//! # }
//! ```

use crate::backend::KeyValueStore;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::pipeline::CachePipeline;
use crate::serialization::{decode, encode, CacheValue, ValueKind};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Keys requested per SCAN round.
pub const SCAN_BATCH_SIZE: usize = 100;

pub(crate) fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::ValidationError(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// An empty match pattern scans everything, as SCAN without MATCH does.
fn match_pattern(pattern: &str) -> &str {
    if pattern.is_empty() {
        "*"
    } else {
        pattern
    }
}

/// Repository over one logical keyspace holding values of type `V`.
///
/// Immutable after construction and cheap to clone; clones share the store's
/// connection pool and the context's cancellation state.
pub struct BaseRepository<V, S> {
    store: S,
    ctx: Context,
    kind: ValueKind,
    metrics: Arc<dyn CacheMetrics>,
    _value: PhantomData<fn() -> V>,
}

impl<V, S: Clone> Clone for BaseRepository<V, S> {
    fn clone(&self) -> Self {
        BaseRepository {
            store: self.store.clone(),
            ctx: self.ctx.clone(),
            kind: self.kind,
            metrics: Arc::clone(&self.metrics),
            _value: PhantomData,
        }
    }
}

impl<V, S> fmt::Debug for BaseRepository<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRepository")
            .field("value", &std::any::type_name::<V>())
            .field("kind", &self.kind)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl<V: CacheValue, S: KeyValueStore> BaseRepository<V, S> {
    /// Bind a repository to an already connected store and a context.
    pub fn new(store: S, ctx: Context) -> Self {
        BaseRepository {
            store,
            ctx,
            kind: V::KIND,
            metrics: Arc::new(NoOpMetrics),
            _value: PhantomData,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn track<T>(&self, key: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.record_error(key, &e.to_string());
        }
        result
    }

    fn decode_fields(&self, pairs: Vec<(String, Vec<u8>)>) -> Result<HashMap<String, V>> {
        let mut values = HashMap::with_capacity(pairs.len());
        for (field, bytes) in pairs {
            let value = decode(&bytes, self.kind).map_err(|e| match e {
                Error::DeserializationError(msg) => {
                    Error::DeserializationError(format!("field {}: {}", field, msg))
                }
                other => other,
            })?;
            values.insert(field, value);
        }
        Ok(values)
    }

    /// Fetch and decode the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - key present
    /// - `Ok(None)` - key absent (not an error)
    ///
    /// # Errors
    /// - `Error::ValidationError` for an empty key
    /// - `Error::BackendError` if the store fails
    /// - `Error::DeserializationError` / `Error::TypeMismatch` for malformed data
    /// - `Error::Cancelled` if the context is done
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        require_non_empty(key, "key")?;
        let timer = Instant::now();

        let result = self.ctx.run("GET", self.store.get(key)).await;
        let value = match self.track(key, result)? {
            Some(bytes) => {
                self.metrics.record_hit(key, timer.elapsed());
                Some(self.track(key, decode(&bytes, self.kind))?)
            }
            None => {
                self.metrics.record_miss(key, timer.elapsed());
                None
            }
        };
        Ok(value)
    }

    /// Encode and store `value`. A `ttl` of `None` or zero means no expiration.
    ///
    /// # Errors
    /// - `Error::ValidationError` for an empty key
    /// - `Error::SerializationError` if the value cannot be encoded
    /// - `Error::BackendError` / `Error::Cancelled`
    pub async fn set(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<()> {
        require_non_empty(key, "key")?;
        let bytes = encode(value)?;
        let ttl = ttl.filter(|d| !d.is_zero());
        let timer = Instant::now();

        let result = self.ctx.run("SET", self.store.set(key, bytes, ttl)).await;
        self.track(key, result)?;
        self.metrics.record_set(key, timer.elapsed());
        Ok(())
    }

    /// Delete `key`, returning whether it existed.
    ///
    /// # Errors
    /// Returns `Error::ValidationError`, `Error::BackendError` or `Error::Cancelled`.
    pub async fn del(&self, key: &str) -> Result<bool> {
        require_non_empty(key, "key")?;
        let timer = Instant::now();

        let result = self.ctx.run("DEL", self.store.delete(&[key])).await;
        let removed = self.track(key, result)?;
        self.metrics.record_delete(key, timer.elapsed());
        Ok(removed > 0)
    }

    /// # Errors
    /// Returns `Error::ValidationError`, `Error::BackendError` or `Error::Cancelled`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        require_non_empty(key, "key")?;
        let result = self.ctx.run("EXISTS", self.store.exists(key)).await;
        self.track(key, result)
    }

    /// Collect every key matching `pattern`.
    ///
    /// Iterates the keyspace with SCAN in rounds of [`SCAN_BATCH_SIZE`] until
    /// the cursor returns to 0. A key reported by several rounds appears
    /// once, in the order it was first seen.
    ///
    /// An empty pattern matches every key.
    ///
    /// # Errors
    /// Returns `Error::BackendError` or `Error::Cancelled`.
    pub async fn get_keys_by_pattern(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = match_pattern(pattern);

        let scan = async {
            let mut seen = HashSet::new();
            let mut keys = Vec::new();
            let mut cursor = 0u64;
            let mut rounds = 0usize;
            loop {
                let (next, batch) = self.store.scan(cursor, pattern, SCAN_BATCH_SIZE).await?;
                rounds += 1;
                for key in batch {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            debug!(
                "✓ SCAN {} -> {} keys in {} rounds",
                pattern,
                keys.len(),
                rounds
            );
            Ok::<_, Error>(keys)
        };

        let result = self.ctx.run("SCAN", scan).await;
        self.track(pattern, result)
    }

    /// Fetch and decode one hash field. A missing key or field is `Ok(None)`.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key or field, otherwise
    /// backend, decoding or cancellation errors.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<V>> {
        require_non_empty(key, "key")?;
        require_non_empty(field, "field")?;
        let timer = Instant::now();

        let result = self.ctx.run("HGET", self.store.hget(key, field)).await;
        let value = match self.track(key, result)? {
            Some(bytes) => {
                self.metrics.record_hit(key, timer.elapsed());
                Some(self.track(key, decode(&bytes, self.kind))?)
            }
            None => {
                self.metrics.record_miss(key, timer.elapsed());
                None
            }
        };
        Ok(value)
    }

    /// Fetch and decode every field of a hash; a missing key yields an empty map.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key, otherwise backend,
    /// decoding or cancellation errors.
    pub async fn hget_all(&self, key: &str) -> Result<HashMap<String, V>> {
        require_non_empty(key, "key")?;

        let result = self.ctx.run("HGETALL", self.store.hget_all(key)).await;
        let pairs = self.track(key, result)?;
        self.track(key, self.decode_fields(pairs))
    }

    /// Fetch the requested fields; fields absent from the hash are omitted
    /// from the result. Requesting no fields returns an empty map without
    /// contacting the store.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key or field name,
    /// otherwise backend, decoding or cancellation errors.
    pub async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<HashMap<String, V>> {
        require_non_empty(key, "key")?;
        for field in fields {
            require_non_empty(field, "field")?;
        }
        if fields.is_empty() {
            return Ok(HashMap::new());
        }

        let result = self.ctx.run("HMGET", self.store.hmget(key, fields)).await;
        let slots = self.track(key, result)?;

        let present = fields
            .iter()
            .zip(slots)
            .filter_map(|(field, slot)| slot.map(|bytes| (field.to_string(), bytes)))
            .collect();
        self.track(key, self.decode_fields(present))
    }

    /// Collect the fields of a hash whose names match `pattern`, iterating
    /// with HSCAN until the cursor returns to 0. A `count` of 0 uses
    /// [`SCAN_BATCH_SIZE`]; an empty pattern matches every field.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key, otherwise
    /// backend, decoding or cancellation errors.
    pub async fn hscan(&self, key: &str, pattern: &str, count: usize) -> Result<HashMap<String, V>> {
        require_non_empty(key, "key")?;
        let pattern = match_pattern(pattern);
        let count = if count == 0 { SCAN_BATCH_SIZE } else { count };

        let scan = async {
            let mut pairs = Vec::new();
            let mut cursor = 0u64;
            loop {
                let (next, batch) = self.store.hscan(key, cursor, pattern, count).await?;
                pairs.extend(batch);
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok::<_, Error>(pairs)
        };

        let result = self.ctx.run("HSCAN", scan).await;
        let pairs = self.track(key, result)?;
        self.track(key, self.decode_fields(pairs))
    }

    /// Set one hash field.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key or field, otherwise
    /// encoding, backend or cancellation errors.
    pub async fn hset(&self, key: &str, field: &str, value: &V) -> Result<()> {
        require_non_empty(key, "key")?;
        require_non_empty(field, "field")?;
        let bytes = encode(value)?;
        let timer = Instant::now();

        let result = self
            .ctx
            .run("HSET", self.store.hset(key, vec![(field.to_string(), bytes)]))
            .await;
        self.track(key, result)?;
        self.metrics.record_set(key, timer.elapsed());
        Ok(())
    }

    /// Set several hash fields in one command.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an empty key, an empty field map
    /// or an empty field name, otherwise encoding, backend or cancellation
    /// errors.
    pub async fn hmset<'a, I, F>(&self, key: &str, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, &'a V)>,
        F: AsRef<str>,
        V: 'a,
    {
        require_non_empty(key, "key")?;
        let mut encoded = Vec::new();
        for (field, value) in fields {
            let field = field.as_ref();
            require_non_empty(field, "field")?;
            encoded.push((field.to_string(), encode(value)?));
        }
        if encoded.is_empty() {
            return Err(Error::ValidationError(
                "fields must not be empty".to_string(),
            ));
        }
        let timer = Instant::now();

        let result = self.ctx.run("HMSET", self.store.hset(key, encoded)).await;
        self.track(key, result)?;
        self.metrics.record_set(key, timer.elapsed());
        Ok(())
    }

    /// Delete one hash field, returning whether it existed.
    ///
    /// # Errors
    /// Returns `Error::ValidationError`, `Error::BackendError` or `Error::Cancelled`.
    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        require_non_empty(key, "key")?;
        require_non_empty(field, "field")?;
        let timer = Instant::now();

        let result = self.ctx.run("HDEL", self.store.hdel(key, &[field])).await;
        let removed = self.track(key, result)?;
        self.metrics.record_delete(key, timer.elapsed());
        Ok(removed > 0)
    }

    /// # Errors
    /// Returns `Error::ValidationError`, `Error::BackendError` or `Error::Cancelled`.
    pub async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        require_non_empty(key, "key")?;
        require_non_empty(field, "field")?;
        let result = self.ctx.run("HEXISTS", self.store.hexists(key, field)).await;
        self.track(key, result)
    }

    /// Start an empty command pipeline on the same store and context.
    pub fn new_pipeline(&self) -> CachePipeline<S> {
        CachePipeline::new(self.store.clone(), self.ctx.clone())
    }
}

/// Override point for concrete repositories.
///
/// Implementors supply [`base`](Self::base); every operation has a default
/// that forwards to it. Override a method to change its behaviour for all
/// callers that go through this trait, including generic code.
///
/// [`BaseRepository`] implements the trait with `base()` returning itself.
#[allow(async_fn_in_trait)]
pub trait CacheRepository: Send + Sync {
    type Value: CacheValue;
    type Store: KeyValueStore;

    fn base(&self) -> &BaseRepository<Self::Value, Self::Store>;

    fn kind(&self) -> ValueKind {
        self.base().kind()
    }

    async fn get(&self, key: &str) -> Result<Option<Self::Value>> {
        self.base().get(key).await
    }

    async fn set(&self, key: &str, value: &Self::Value, ttl: Option<Duration>) -> Result<()> {
        self.base().set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.base().del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.base().exists(key).await
    }

    async fn get_keys_by_pattern(&self, pattern: &str) -> Result<Vec<String>> {
        self.base().get_keys_by_pattern(pattern).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Self::Value>> {
        self.base().hget(key, field).await
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, Self::Value>> {
        self.base().hget_all(key).await
    }

    async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<HashMap<String, Self::Value>> {
        self.base().hget_fields(key, fields).await
    }

    async fn hscan(
        &self,
        key: &str,
        pattern: &str,
        count: usize,
    ) -> Result<HashMap<String, Self::Value>> {
        self.base().hscan(key, pattern, count).await
    }

    async fn hset(&self, key: &str, field: &str, value: &Self::Value) -> Result<()> {
        self.base().hset(key, field, value).await
    }

    async fn hmset(&self, key: &str, fields: &HashMap<String, Self::Value>) -> Result<()> {
        self.base().hmset(key, fields).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        self.base().hdel(key, field).await
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        self.base().hexists(key, field).await
    }

    fn new_pipeline(&self) -> CachePipeline<Self::Store> {
        self.base().new_pipeline()
    }
}

impl<V: CacheValue, S: KeyValueStore> CacheRepository for BaseRepository<V, S> {
    type Value = V;
    type Store = S;

    fn base(&self) -> &BaseRepository<V, S> {
        self
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::backend::InMemoryStore;
    use crate::entity::CacheEntity;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: u64,
        roles: Vec<String>,
    }

    impl CacheEntity for Session {}

    fn session(user_id: u64) -> Session {
        Session {
            user_id,
            roles: vec!["reader".to_string()],
        }
    }

    fn repo<V: CacheValue>(store: &InMemoryStore) -> BaseRepository<V, InMemoryStore> {
        BaseRepository::new(store.clone(), Context::background())
    }

    #[test]
    fn test_kind_recorded_at_construction() {
        let store = InMemoryStore::new();
        assert_eq!(repo::<i64>(&store).kind(), ValueKind::Primitive);
        assert_eq!(repo::<Session>(&store).kind(), ValueKind::Structured);
    }

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);
        assert_eq!(repo.get("never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = InMemoryStore::new();

        let names = repo::<String>(&store);
        names.set("name", &"alice".to_string(), None).await.unwrap();
        assert_eq!(names.get("name").await.unwrap(), Some("alice".to_string()));

        let sessions = repo::<Session>(&store);
        sessions
            .set("session:1", &session(1), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(sessions.get("session:1").await.unwrap(), Some(session(1)));
    }

    #[tokio::test]
    async fn test_primitive_stored_as_text() {
        let store = InMemoryStore::new();
        repo::<i64>(&store).set("n", &42, None).await.unwrap();

        let raw = store.get("n").await.unwrap();
        assert_eq!(raw, Some(b"42".to_vec()));
    }

    #[tokio::test]
    async fn test_structured_read_of_text_is_decoding_error() {
        let store = InMemoryStore::new();
        store.set("s", b"not json".to_vec(), None).await.unwrap();

        let err = repo::<Session>(&store).get("s").await.unwrap_err();
        assert!(matches!(err, Error::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_empty_identifiers_rejected() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);
        let value = "v".to_string();

        assert!(matches!(repo.get("").await, Err(Error::ValidationError(_))));
        assert!(matches!(
            repo.set("", &value, None).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            repo.hset("h", "", &value).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            repo.hset("", "f", &value).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            repo.hscan("", "*", 0).await,
            Err(Error::ValidationError(_))
        ));

        let empty: HashMap<String, String> = HashMap::new();
        assert!(matches!(
            repo.hmset("h", &empty).await,
            Err(Error::ValidationError(_))
        ));
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_empty_pattern_matches_everything() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);
        let value = "v".to_string();

        repo.set("k", &value, None).await.unwrap();
        repo.hset("h", "a", &value).await.unwrap();
        repo.hset("h", "b", &value).await.unwrap();

        let mut keys = repo.get_keys_by_pattern("").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["h".to_string(), "k".to_string()]);

        let fields = repo.hscan("h", "", 0).await.unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[tokio::test]
    async fn test_del_and_exists() {
        let store = InMemoryStore::new();
        let repo = repo::<u32>(&store);

        repo.set("k", &1, None).await.unwrap();
        assert!(repo.exists("k").await.unwrap());
        assert!(repo.del("k").await.unwrap());
        assert!(!repo.exists("k").await.unwrap());
        assert!(!repo.del("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_means_no_expiration() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);

        repo.set("forever", &"x".to_string(), Some(Duration::ZERO))
            .await
            .unwrap();
        repo.set("brief", &"y".to_string(), Some(Duration::from_secs(1)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(repo.get("forever").await.unwrap(), Some("x".to_string()));
        assert_eq!(repo.get("brief").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_never_expires() {
        let store = InMemoryStore::new();
        let repo = BaseRepository::<String, _>::new(
            store.clone(),
            Context::with_timeout(Duration::MAX),
        );

        repo.set("k", &"v".to_string(), Some(Duration::MAX))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;

        assert_eq!(repo.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_get_keys_by_pattern_spans_rounds() {
        let store = InMemoryStore::new();
        let repo = repo::<u32>(&store);

        for i in 0..250 {
            repo.set(&format!("user:{}", i), &i, None).await.unwrap();
        }
        repo.set("order:1", &1, None).await.unwrap();

        let before = store.round_trips();
        let mut keys = repo.get_keys_by_pattern("user:*").await.unwrap();
        assert_eq!(store.round_trips() - before, 3);

        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 250);
    }

    #[tokio::test]
    async fn test_hash_operations() {
        let store = InMemoryStore::new();
        let repo = repo::<Session>(&store);

        repo.hset("sessions", "a", &session(1)).await.unwrap();
        repo.hset("sessions", "b", &session(2)).await.unwrap();

        assert_eq!(repo.hget("sessions", "a").await.unwrap(), Some(session(1)));
        assert_eq!(repo.hget("sessions", "zz").await.unwrap(), None);
        assert!(repo.hexists("sessions", "b").await.unwrap());

        let all = repo.hget_all("sessions").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["b"], session(2));

        assert!(repo.hdel("sessions", "a").await.unwrap());
        assert!(!repo.hexists("sessions", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_hget_fields_omits_missing() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);

        repo.hset("h", "field", &"v".to_string()).await.unwrap();
        let values = repo.hget_fields("h", &["field", "missing"]).await.unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values["field"], "v");
    }

    #[tokio::test]
    async fn test_hget_fields_without_fields_skips_store() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);

        let values = repo.hget_fields("h", &[]).await.unwrap();
        assert!(values.is_empty());
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_hmset_and_hscan() {
        let store = InMemoryStore::new();
        let repo = repo::<i64>(&store);

        let fields: HashMap<String, i64> = (0..30)
            .map(|i| (format!("f{}", i), i))
            .chain([("other".to_string(), -1)])
            .collect();
        repo.hmset("h", &fields).await.unwrap();

        let matched = repo.hscan("h", "f*", 7).await.unwrap();
        assert_eq!(matched.len(), 30);
        assert_eq!(matched["f12"], 12);

        let everything = repo.hscan("h", "*", 0).await.unwrap();
        assert_eq!(everything.len(), 31);
    }

    #[tokio::test]
    async fn test_wrong_type_is_backend_error() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);

        repo.hset("h", "f", &"v".to_string()).await.unwrap();
        let err = repo.get("h").await.unwrap_err();
        assert!(matches!(err, Error::BackendError(_)));
    }

    #[tokio::test]
    async fn test_disconnected_store_is_backend_error() {
        let store = InMemoryStore::new();
        let repo = repo::<String>(&store);

        store.disconnect();
        let err = repo.get("k").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let store = InMemoryStore::new();
        let ctx = Context::background();
        let repo: BaseRepository<String, _> = BaseRepository::new(store.clone(), ctx.clone());

        ctx.cancel();
        let err = repo.get("k").await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(store.round_trips(), 0);
    }

    #[derive(Default)]
    struct RecordingMetrics {
        events: Mutex<Vec<String>>,
    }

    impl CacheMetrics for RecordingMetrics {
        fn record_hit(&self, key: &str, _duration: Duration) {
            self.events.lock().unwrap().push(format!("hit {}", key));
        }
        fn record_miss(&self, key: &str, _duration: Duration) {
            self.events.lock().unwrap().push(format!("miss {}", key));
        }
        fn record_set(&self, key: &str, _duration: Duration) {
            self.events.lock().unwrap().push(format!("set {}", key));
        }
        fn record_error(&self, key: &str, _error: &str) {
            self.events.lock().unwrap().push(format!("error {}", key));
        }
    }

    #[tokio::test]
    async fn test_metrics_hooks() {
        let store = InMemoryStore::new();
        let metrics = Arc::new(RecordingMetrics::default());
        let repo: BaseRepository<String, _> =
            BaseRepository::new(store.clone(), Context::background())
                .with_metrics(metrics.clone());

        repo.get("k").await.unwrap();
        repo.set("k", &"v".to_string(), None).await.unwrap();
        repo.get("k").await.unwrap();
        store.disconnect();
        let _ = repo.get("k").await;

        let events = metrics.events.lock().unwrap().clone();
        assert_eq!(events, vec!["miss k", "set k", "hit k", "error k"]);
    }

    /// Counts reads and namespaces scalar keys; everything else is inherited.
    struct NamespacedRepository {
        base: BaseRepository<String, InMemoryStore>,
        reads: AtomicUsize,
    }

    impl CacheRepository for NamespacedRepository {
        type Value = String;
        type Store = InMemoryStore;

        fn base(&self) -> &BaseRepository<String, InMemoryStore> {
            &self.base
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.base.get(&format!("ns:{}", key)).await
        }

        async fn set(&self, key: &str, value: &String, ttl: Option<Duration>) -> Result<()> {
            self.base.set(&format!("ns:{}", key), value, ttl).await
        }
    }

    async fn write_then_read<R: CacheRepository>(
        repo: &R,
        key: &str,
        value: R::Value,
    ) -> Result<Option<R::Value>> {
        repo.set(key, &value, None).await?;
        repo.get(key).await
    }

    #[tokio::test]
    async fn test_override_reached_through_generic_code() {
        let store = InMemoryStore::new();
        let custom = NamespacedRepository {
            base: repo(&store),
            reads: AtomicUsize::new(0),
        };

        let value = write_then_read(&custom, "k", "v".to_string()).await.unwrap();
        assert_eq!(value, Some("v".to_string()));
        assert_eq!(custom.reads.load(Ordering::SeqCst), 1);

        // Inherited methods operate on the raw keyspace.
        assert!(custom.exists("ns:k").await.unwrap());
        assert!(!custom.exists("k").await.unwrap());
        assert_eq!(
            custom.get_keys_by_pattern("ns:*").await.unwrap(),
            vec!["ns:k".to_string()]
        );
    }

    #[tokio::test]
    async fn test_base_repository_is_its_own_base() {
        let store = InMemoryStore::new();
        let base = repo::<String>(&store);

        let value = write_then_read(&base, "k", "v".to_string()).await.unwrap();
        assert_eq!(value, Some("v".to_string()));
        assert!(store.get("k").await.unwrap().is_some());
    }
}

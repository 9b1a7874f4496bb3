//! In-memory key-value store (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding and mimics the
//! Redis semantics repositories rely on: string and hash values, TTLs,
//! glob-style `SCAN`/`HSCAN` with cursors, `WRONGTYPE` errors, and atomic
//! batches. Useful for tests and local development.

use super::{Command, KeyValueStore, Reply};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::time::Instant;

/// Redis' default `COUNT` for scans.
const DEFAULT_SCAN_COUNT: usize = 10;

enum Stored {
    Bytes(Vec<u8>),
    Hash(BTreeMap<String, Vec<u8>>),
}

/// In-memory entry with optional expiration.
struct StoreEntry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn new(value: Stored, ttl: Option<Duration>) -> Self {
        StoreEntry {
            value,
            expires_at: ttl.and_then(expiry_from_now),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// `None` when the TTL runs past what an `Instant` can hold; such keys never expire.
fn expiry_from_now(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}

fn wrong_type(key: &str) -> Error {
    Error::BackendError(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
        key
    ))
}

fn not_an_integer(key: &str) -> Error {
    Error::BackendError(format!(
        "ERR value is not an integer or out of range: {}",
        key
    ))
}

/// Thread-safe async in-memory store.
///
/// Clones share the same keyspace. Single commands run concurrently; a batch
/// passed to [`execute`](KeyValueStore::execute) holds an exclusive gate so
/// no other command observes it half applied.
///
/// # Example
///
/// ```no_run
/// use cache_repository::backend::{InMemoryStore, KeyValueStore};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store.set("key1", b"value".to_vec(), None).await?;
///     assert!(store.get("key1").await?.is_some());
///
///     store.set("key2", b"expires".to_vec(), Some(Duration::from_secs(300))).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    store: Arc<DashMap<String, StoreEntry>>,
    batch_gate: Arc<RwLock<()>>,
    round_trips: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            store: Arc::new(DashMap::new()),
            batch_gate: Arc::new(RwLock::new(())),
            round_trips: Arc::new(AtomicU64::new(0)),
            connected: Arc::new(AtomicBool::new(true)),
            latency: None,
        }
    }

    /// Delay every round trip by `latency`, simulating a slow remote store.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of round trips served so far (a batch counts as one).
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the connection was lost.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        warn!("⚠ InMemory store disconnected");
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Number of keys currently held, including not yet purged expired ones.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    async fn begin(&self, op: &str) -> Result<RwLockReadGuard<'_, ()>> {
        self.round_trip(op).await?;
        Ok(self.batch_gate.read().await)
    }

    async fn round_trip(&self, op: &str) -> Result<()> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!(
                "InMemory {} failed: connection refused",
                op
            )));
        }
        Ok(())
    }

    fn purge_if_expired(&self, key: &str) {
        self.store.remove_if(key, |_, entry| entry.is_expired());
    }

    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.purge_if_expired(key);
        match self.store.get(key) {
            Some(entry) => match &entry.value {
                Stored::Bytes(data) => Ok(Some(data.clone())),
                Stored::Hash(_) => Err(wrong_type(key)),
            },
            None => Ok(None),
        }
    }

    fn write_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        self.store
            .insert(key.to_string(), StoreEntry::new(Stored::Bytes(value), ttl));
    }

    fn remove_keys<K: AsRef<str>>(&self, keys: &[K]) -> u64 {
        let mut removed = 0;
        for key in keys {
            let key: &str = key.as_ref();
            if let Some((_, entry)) = self.store.remove(key) {
                if !entry.is_expired() {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn read_field(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.purge_if_expired(key);
        match self.store.get(key) {
            Some(entry) => match &entry.value {
                Stored::Hash(map) => Ok(map.get(field).cloned()),
                Stored::Bytes(_) => Err(wrong_type(key)),
            },
            None => Ok(None),
        }
    }

    fn read_hash(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.purge_if_expired(key);
        match self.store.get(key) {
            Some(entry) => match &entry.value {
                Stored::Hash(map) => Ok(map
                    .iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()),
                Stored::Bytes(_) => Err(wrong_type(key)),
            },
            None => Ok(Vec::new()),
        }
    }

    /// Returns the number of fields that did not exist before.
    fn write_fields(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<u64> {
        self.purge_if_expired(key);
        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| StoreEntry::new(Stored::Hash(BTreeMap::new()), None));

        match &mut entry.value {
            Stored::Hash(map) => {
                let mut added = 0;
                for (field, value) in fields {
                    if map.insert(field, value).is_none() {
                        added += 1;
                    }
                }
                Ok(added)
            }
            Stored::Bytes(_) => Err(wrong_type(key)),
        }
    }

    fn remove_fields<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> Result<u64> {
        self.purge_if_expired(key);
        let removed = match self.store.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Stored::Hash(map) => {
                    let mut removed = 0;
                    for field in fields {
                        let field: &str = field.as_ref();
                        if map.remove(field).is_some() {
                            removed += 1;
                        }
                    }
                    removed
                }
                Stored::Bytes(_) => return Err(wrong_type(key)),
            },
            None => 0,
        };

        // Redis drops a hash once its last field is gone.
        self.store
            .remove_if(key, |_, entry| matches!(&entry.value, Stored::Hash(map) if map.is_empty()));
        Ok(removed)
    }

    fn expire_key(&self, key: &str, ttl: Duration) -> u64 {
        self.purge_if_expired(key);
        if ttl.is_zero() {
            return self.remove_keys(&[key]);
        }
        match self.store.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = expiry_from_now(ttl);
                1
            }
            None => 0,
        }
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| StoreEntry::new(Stored::Bytes(b"0".to_vec()), None));

        match &mut entry.value {
            Stored::Bytes(data) => {
                let current: i64 = std::str::from_utf8(data)
                    .ok()
                    .and_then(|text| text.parse().ok())
                    .ok_or_else(|| not_an_integer(key))?;
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| not_an_integer(key))?;
                *data = next.to_string().into_bytes();
                Ok(next)
            }
            Stored::Hash(_) => Err(wrong_type(key)),
        }
    }

    fn apply(&self, command: &Command) -> Result<Reply> {
        match command {
            Command::Set { key, value, ttl } => {
                self.write_bytes(key, value.clone(), *ttl);
                Ok(Reply::Ok)
            }
            Command::HSet { key, field, value } => {
                let added = self.write_fields(key, vec![(field.clone(), value.clone())])?;
                Ok(Reply::Int(added as i64))
            }
            Command::HMSet { key, fields } => {
                self.write_fields(key, fields.clone())?;
                Ok(Reply::Ok)
            }
            Command::HDel { key, fields } => {
                let removed = self.remove_fields(key, fields)?;
                Ok(Reply::Int(removed as i64))
            }
            Command::Del { keys } => Ok(Reply::Int(self.remove_keys(keys) as i64)),
            Command::Expire { key, ttl } => Ok(Reply::Int(self.expire_key(key, *ttl) as i64)),
            Command::IncrBy { key, amount } => self.increment(key, *amount).map(Reply::Int),
            Command::DecrBy { key, amount } => {
                let delta = amount.checked_neg().ok_or_else(|| not_an_integer(key))?;
                self.increment(key, delta).map(Reply::Int)
            }
        }
    }

    fn live_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .store
            .iter()
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor positions index into a sorted snapshot taken on every round, so
/// keys added between rounds can shift the window and be returned twice.
fn scan_window<T>(items: &[T], cursor: u64, count: usize) -> (u64, &[T]) {
    let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };
    let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(items.len());
    let end = start.saturating_add(count).min(items.len());
    let next = if end >= items.len() { 0 } else { end as u64 };
    (next, &items[start..end])
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _gate = self.begin("GET").await?;
        let value = self.read_bytes(key)?;

        if value.is_some() {
            debug!("✓ InMemory GET {} -> HIT", key);
        } else {
            debug!("✓ InMemory GET {} -> MISS", key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let _gate = self.begin("SET").await?;
        self.write_bytes(key, value, ttl);

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64> {
        let _gate = self.begin("DEL").await?;
        let removed = self.remove_keys(keys);
        debug!("✓ InMemory DEL {} keys ({} removed)", keys.len(), removed);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let _gate = self.begin("EXISTS").await?;
        self.purge_if_expired(key);
        Ok(self.store.contains_key(key))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let _gate = self.begin("SCAN").await?;
        let keys = self.live_keys();
        let (next, window) = scan_window(&keys, cursor, count);
        let matched: Vec<String> = window
            .iter()
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect();

        debug!(
            "✓ InMemory SCAN {} MATCH {} -> {} keys, next {}",
            cursor,
            pattern,
            matched.len(),
            next
        );
        Ok((next, matched))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let _gate = self.begin("HGET").await?;
        self.read_field(key, field)
    }

    async fn hget_all(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let _gate = self.begin("HGETALL").await?;
        self.read_hash(key)
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let _gate = self.begin("HMGET").await?;
        fields
            .iter()
            .map(|field| self.read_field(key, field))
            .collect()
    }

    async fn hscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<(String, Vec<u8>)>)> {
        let _gate = self.begin("HSCAN").await?;
        let pairs = self.read_hash(key)?;
        let (next, window) = scan_window(&pairs, cursor, count);
        let matched = window
            .iter()
            .filter(|(field, _)| glob_match(pattern.as_bytes(), field.as_bytes()))
            .cloned()
            .collect();
        Ok((next, matched))
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()> {
        let _gate = self.begin("HSET").await?;
        let count = fields.len();
        self.write_fields(key, fields)?;
        debug!("✓ InMemory HSET {} ({} fields)", key, count);
        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64> {
        let _gate = self.begin("HDEL").await?;
        self.remove_fields(key, fields)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let _gate = self.begin("HEXISTS").await?;
        Ok(self.read_field(key, field)?.is_some())
    }

    async fn execute(&self, commands: &[Command]) -> Result<Vec<Reply>> {
        self.round_trip("EXEC").await?;
        let _gate = self.batch_gate.write().await;

        // Like MULTI/EXEC: a failing command does not roll back the others.
        let mut replies = Vec::with_capacity(commands.len());
        let mut first_error = None;
        for command in commands {
            match self.apply(command) {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    warn!("InMemory EXEC: {} failed: {}", command.name(), e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        debug!("✓ InMemory EXEC {} commands", commands.len());
        Ok(replies)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.connected.load(Ordering::SeqCst))
    }
}

/// Redis-style glob matching: `*`, `?`, `[abc]`, `[^a-z]` and `\` escapes.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                b'*' => {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                b'?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                b'[' => match match_class(pattern, p, text[t]) {
                    Some((true, next)) => {
                        p = next;
                        t += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    None if text[t] == b'[' => {
                        p += 1;
                        t += 1;
                        continue;
                    }
                    None => {}
                },
                b'\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == text[t] {
                        p += 2;
                        t += 1;
                        continue;
                    }
                }
                c if c == text[t] => {
                    p += 1;
                    t += 1;
                    continue;
                }
                _ => {}
            }
        }

        match backtrack {
            Some((star, matched)) => {
                p = star + 1;
                t = matched + 1;
                backtrack = Some((star, matched + 1));
            }
            None => return false,
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

/// Match `ch` against the class opening at `pattern[open]`.
///
/// Returns whether it matched and the index after the closing `]`, or `None`
/// for an unterminated class.
fn match_class(pattern: &[u8], open: usize, ch: u8) -> Option<(bool, usize)> {
    let mut i = open + 1;
    let negate = pattern.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        let c = *pattern.get(i)?;
        match c {
            b']' => return Some((matched != negate, i + 1)),
            b'\\' if i + 1 < pattern.len() => {
                matched |= pattern[i + 1] == ch;
                i += 2;
            }
            _ if i + 2 < pattern.len() && pattern[i + 1] == b'-' && pattern[i + 2] != b']' => {
                let (lo, hi) = if c <= pattern[i + 2] {
                    (c, pattern[i + 2])
                } else {
                    (pattern[i + 2], c)
                };
                matched |= (lo..=hi).contains(&ch);
                i += 3;
            }
            _ => {
                matched |= c == ch;
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_store_set_get() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = store.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_store_miss() {
        let store = InMemoryStore::new();

        let result = store.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_store_delete_counts_existing() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let removed = store
            .delete(&["key1", "missing"])
            .await
            .expect("Failed to delete");
        assert_eq!(removed, 1);
        assert!(!store.exists("key1").await.expect("Failed to check exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_store_ttl_expiration() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(100)))
            .await
            .expect("Failed to set");

        assert!(store.get("key1").await.expect("Failed to get").is_some());

        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(store.get("key1").await.expect("Failed to get").is_none());
        assert!(!store.exists("key1").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_inmemory_store_unbounded_ttl_never_expires() {
        let store = InMemoryStore::new();

        store
            .set("forever", b"v".to_vec(), Some(Duration::MAX))
            .await
            .expect("Failed to set");
        store
            .set("later", b"v".to_vec(), None)
            .await
            .expect("Failed to set");

        let replies = store
            .execute(&[Command::Expire {
                key: "later".into(),
                ttl: Duration::MAX,
            }])
            .await
            .expect("Failed to execute");
        assert_eq!(replies, vec![Reply::Int(1)]);

        assert!(store.exists("forever").await.expect("Failed to check exists"));
        assert!(store.exists("later").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_inmemory_store_wrong_type() {
        let store = InMemoryStore::new();
        store
            .set("plain", b"v".to_vec(), None)
            .await
            .expect("Failed to set");

        let err = store.hget("plain", "f").await.unwrap_err();
        assert!(err.to_string().contains("WRONGTYPE"));

        store
            .hset("hash", vec![("f".to_string(), b"v".to_vec())])
            .await
            .expect("Failed to hset");
        assert!(store.get("hash").await.is_err());
    }

    #[tokio::test]
    async fn test_inmemory_store_hdel_drops_empty_hash() {
        let store = InMemoryStore::new();
        store
            .hset("h", vec![("only".to_string(), b"1".to_vec())])
            .await
            .expect("Failed to hset");

        assert_eq!(store.hdel("h", &["only"]).await.expect("Failed to hdel"), 1);
        assert!(!store.exists("h").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_inmemory_store_scan_pages() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store
                .set(&format!("user:{:02}", i), b"x".to_vec(), None)
                .await
                .expect("Failed to set");
        }
        store
            .set("order:1", b"x".to_vec(), None)
            .await
            .expect("Failed to set");

        let mut cursor = 0;
        let mut rounds = 0;
        let mut found = Vec::new();
        loop {
            let (next, keys) = store.scan(cursor, "user:*", 10).await.expect("Failed to scan");
            found.extend(keys);
            rounds += 1;
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        assert_eq!(rounds, 3);
        assert_eq!(found.len(), 25);
        assert!(found.iter().all(|k| k.starts_with("user:")));
    }

    #[tokio::test]
    async fn test_inmemory_store_execute_is_one_round_trip() {
        let store = InMemoryStore::new();
        let before = store.round_trips();

        let replies = store
            .execute(&[
                Command::Set {
                    key: "counter".into(),
                    value: b"10".to_vec(),
                    ttl: None,
                },
                Command::IncrBy {
                    key: "counter".into(),
                    amount: 5,
                },
                Command::DecrBy {
                    key: "counter".into(),
                    amount: 2,
                },
            ])
            .await
            .expect("Failed to execute");

        assert_eq!(store.round_trips() - before, 1);
        assert_eq!(replies, vec![Reply::Ok, Reply::Int(15), Reply::Int(13)]);
    }

    #[tokio::test]
    async fn test_inmemory_store_execute_reports_failing_command() {
        let store = InMemoryStore::new();

        let result = store
            .execute(&[
                Command::Set {
                    key: "name".into(),
                    value: b"alice".to_vec(),
                    ttl: None,
                },
                Command::IncrBy {
                    key: "name".into(),
                    amount: 1,
                },
                Command::Set {
                    key: "after".into(),
                    value: b"1".to_vec(),
                    ttl: None,
                },
            ])
            .await;

        assert!(matches!(result, Err(Error::BackendError(_))));
        // No rollback
        assert!(store.get("after").await.expect("Failed to get").is_some());
    }

    #[tokio::test]
    async fn test_inmemory_store_disconnect() {
        let store = InMemoryStore::new();
        store.disconnect();

        assert!(matches!(
            store.get("k").await,
            Err(Error::BackendError(_))
        ));
        assert!(!store.health_check().await.expect("Failed to check health"));

        store.reconnect();
        assert!(store.get("k").await.is_ok());
    }

    #[tokio::test]
    async fn test_inmemory_store_clone_shares_keyspace() {
        let store1 = InMemoryStore::new();
        store1
            .set("key", b"value".to_vec(), None)
            .await
            .expect("Failed to set");

        let store2 = store1.clone();
        let value = store2.store.get("key").map(|e| match &e.value {
            Stored::Bytes(data) => data.clone(),
            Stored::Hash(_) => Vec::new(),
        });
        assert_eq!(value, Some(b"value".to_vec()));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match(b"*", b"anything"));
        assert!(glob_match(b"user:*", b"user:42"));
        assert!(!glob_match(b"user:*", b"order:42"));
        assert!(glob_match(b"h?llo", b"hello"));
        assert!(!glob_match(b"h?llo", b"hllo"));
        assert!(glob_match(b"h[ae]llo", b"hallo"));
        assert!(!glob_match(b"h[ae]llo", b"hillo"));
        assert!(glob_match(b"h[^e]llo", b"hallo"));
        assert!(!glob_match(b"h[^e]llo", b"hello"));
        assert!(glob_match(b"h[a-c]llo", b"hbllo"));
        assert!(glob_match(b"*:*:profile", b"user:1:profile"));
        assert!(glob_match(b"literal\\*", b"literal*"));
        assert!(!glob_match(b"literal\\*", b"literalX"));
        assert!(glob_match(b"a*b*c", b"aXXbYYc"));
        assert!(!glob_match(b"a*b*c", b"aXXbYY"));
    }
}

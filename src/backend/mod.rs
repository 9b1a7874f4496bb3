//! Key-value store backends.

use crate::error::{Error, Result};
use crate::serialization::CacheValue;
use std::time::Duration;

#[cfg(feature = "inmemory")]
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisConfig, RedisConnector, RedisStore};

/// A single queued pipeline command with its payload already encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    },
    HSet {
        key: String,
        field: String,
        value: Vec<u8>,
    },
    HMSet {
        key: String,
        fields: Vec<(String, Vec<u8>)>,
    },
    HDel {
        key: String,
        fields: Vec<String>,
    },
    Del {
        keys: Vec<String>,
    },
    Expire {
        key: String,
        ttl: Duration,
    },
    IncrBy {
        key: String,
        amount: i64,
    },
    DecrBy {
        key: String,
        amount: i64,
    },
}

impl Command {
    /// Redis command name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::HSet { .. } => "HSET",
            Command::HMSet { .. } => "HMSET",
            Command::HDel { .. } => "HDEL",
            Command::Del { .. } => "DEL",
            Command::Expire { .. } => "EXPIRE",
            Command::IncrBy { .. } => "INCRBY",
            Command::DecrBy { .. } => "DECRBY",
        }
    }
}

/// Store-independent reply to one pipelined command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Ok,
    Int(i64),
    Data(Vec<u8>),
    Status(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            Reply::Data(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// Decode a data reply as `T`; `Nil` decodes to `None`.
    ///
    /// # Errors
    /// Returns `Error::TypeMismatch` for replies that carry no payload, or
    /// the decoding error of `T`.
    pub fn decode<T: CacheValue>(&self) -> Result<Option<T>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Data(bytes) => T::from_bytes(bytes).map(Some),
            Reply::Int(n) => T::from_bytes(n.to_string().as_bytes()).map(Some),
            other => Err(Error::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: format!("{:?}", other),
            }),
        }
    }
}

/// Trait for key-value store implementations.
///
/// This is the only seam between repositories and the remote store; it is
/// supplied already connected and owns its own connection pool.
///
/// **IMPORTANT:** All methods use `&self` to allow concurrent access.
/// Implementations should use interior mutability or external storage.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore: Send + Sync + Clone {
    /// Retrieve a string value.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - key present
    /// - `Ok(None)` - key absent
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or the key holds a hash.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a string value. `ttl` of `None` means no expiration.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove keys, returning how many existed.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn delete(&self, keys: &[&str]) -> Result<u64>;

    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// One bounded round of cursor-based key iteration.
    ///
    /// Start with cursor `0`; iteration is complete when the returned cursor
    /// is `0` again. A round may return keys already seen in an earlier round.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)>;

    /// # Errors
    /// Returns `Err` if the store is unreachable or the key holds a string.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// # Errors
    /// Returns `Err` if the store is unreachable or the key holds a string.
    async fn hget_all(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Bulk field lookup, one slot per requested field.
    ///
    /// Default implementation calls `hget()` for each field.
    /// Override for batch efficiency (e.g., Redis HMGET).
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut results = Vec::with_capacity(fields.len());
        for field in fields {
            results.push(self.hget(key, field).await?);
        }
        Ok(results)
    }

    /// One bounded round of cursor-based field iteration within a hash.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn hscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<(String, Vec<u8>)>)>;

    /// Set one or more hash fields.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or the key holds a string.
    async fn hset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()>;

    /// Remove hash fields, returning how many existed.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64>;

    /// # Errors
    /// Returns `Err` if the store is unreachable.
    async fn hexists(&self, key: &str, field: &str) -> Result<bool>;

    /// Execute a batch atomically in a single round trip.
    ///
    /// Replies are returned in submission order.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or any command fails.
    async fn execute(&self, commands: &[Command]) -> Result<Vec<Reply>>;

    /// Health check - verify the store is reachable.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

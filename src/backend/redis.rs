//! Redis store implementation.

use super::{Command, KeyValueStore, Reply};
use crate::bootstrap::Connector;
use crate::config::{self, EnvLookup};
use crate::error::{Error, Result};
use deadpool_redis::redis::{self, AsyncCommands, Value};
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use std::collections::HashMap;
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Formula: (CPU cores × 2) + 1
/// For 8-core systems: 16 connections is optimal
/// Override with REDIS_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for the Redis store.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        if let Some(password) = &self.password {
            if let Some(username) = &self.username {
                format!(
                    "redis://{}:{}@{}:{}/{}",
                    username, password, self.host, self.port, self.database
                )
            } else {
                format!(
                    "redis://default:{}@{}:{}/{}",
                    password, self.host, self.port, self.database
                )
            }
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// See [`from_lookup`](Self::from_lookup) for the variables used.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(config::process_env)
    }

    /// Build a configuration from `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`,
    /// `REDIS_USERNAME`, `REDIS_PASSWORD`, `REDIS_POOL_SIZE` and
    /// `REDIS_CONNECT_TIMEOUT_SECS`, falling back to the defaults for unset
    /// variables.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable does not parse.
    pub fn from_lookup<L: EnvLookup>(lookup: L) -> Result<Self> {
        let defaults = RedisConfig::default();
        let timeout_secs = config::parse_var(
            &lookup,
            config::REDIS_CONNECT_TIMEOUT_SECS,
            defaults.connection_timeout.as_secs(),
        )?;

        Ok(RedisConfig {
            host: config::string_var(&lookup, config::REDIS_HOST).unwrap_or(defaults.host),
            port: config::parse_var(&lookup, config::REDIS_PORT, defaults.port)?,
            username: config::string_var(&lookup, config::REDIS_USERNAME),
            password: config::string_var(&lookup, config::REDIS_PASSWORD),
            database: config::parse_var(&lookup, config::REDIS_DB, defaults.database)?,
            pool_size: config::parse_var(&lookup, config::REDIS_POOL_SIZE, defaults.pool_size)?,
            connection_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn pool_size_from<L: EnvLookup>(lookup: L) -> Result<u32> {
    config::parse_var(&lookup, config::REDIS_POOL_SIZE, DEFAULT_POOL_SIZE)
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// PEXPIRE argument: zero deletes the key, anything shorter than 1 ms rounds up.
fn expire_millis(ttl: Duration) -> i64 {
    if ttl.is_zero() {
        return 0;
    }
    i64::try_from(ttl_millis(ttl)).unwrap_or(i64::MAX)
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => Reply::Nil,
            Value::Okay => Reply::Ok,
            Value::Int(n) => Reply::Int(n),
            Value::BulkString(data) => Reply::Data(data),
            Value::SimpleString(status) => Reply::Status(status),
            Value::Array(items) | Value::Set(items) => {
                Reply::Array(items.into_iter().map(Reply::from).collect())
            }
            Value::Double(d) => Reply::Data(d.to_string().into_bytes()),
            Value::Boolean(b) => Reply::Int(i64::from(b)),
            other => Reply::Status(format!("{:?}", other)),
        }
    }
}

/// Redis store with connection pooling and async operations.
///
/// Uses deadpool for efficient async resource management and pooling.
///
/// # Example
///
/// ```no_run
/// # use cache_repository::backend::{RedisStore, RedisConfig, KeyValueStore};
/// # use cache_repository::error::Result;
/// # async fn example() -> Result<()> {
/// let config = RedisConfig::default();
/// let store = RedisStore::connect(config).await?;
///
/// store.set("key", b"value".to_vec(), None).await?;
/// let value = store.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create a Redis store from configuration.
    ///
    /// Connections are opened lazily; use [`connect`](Self::connect) to fail
    /// fast on an unreachable server.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let conn_str = config.connection_string();
        let mut cfg = PoolConfig::from_url(conn_str);
        let mut pool_cfg = deadpool_redis::PoolConfig::new(config.pool_size as usize);
        pool_cfg.timeouts.wait = Some(config.connection_timeout);
        pool_cfg.timeouts.create = Some(config.connection_timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        info!("✓ Redis store initialized: {}:{}", config.host, config.port);

        Ok(RedisStore { pool })
    }

    /// Create from connection string directly.
    ///
    /// Pool size is determined by:
    /// 1. `REDIS_POOL_SIZE` environment variable (if set)
    /// 2. `DEFAULT_POOL_SIZE` constant (16)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `REDIS_POOL_SIZE` is malformed, or
    /// `Err` if pool creation fails.
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let pool_size = pool_size_from(config::process_env)?;

        let mut cfg = PoolConfig::from_url(conn_str);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size as usize));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis store initialized from connection string (pool size: {})",
            pool_size
        );

        Ok(RedisStore { pool })
    }

    /// Create the store and verify the server answers `PING`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the server cannot be reached.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let store = Self::new(config).await?;
        if !store.health_check().await? {
            return Err(Error::BackendError(
                "Redis did not answer PING".to_string(),
            ));
        }
        Ok(store)
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        match ttl {
            Some(duration) => {
                let millis = ttl_millis(duration);
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(|e| {
                        Error::BackendError(format!("Redis PSETEX failed for key {}: {}", key, e))
                    })?;
                debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    Error::BackendError(format!("Redis SET failed for key {}: {}", key, e))
                })?;
                debug!("✓ Redis SET {}", key);
            }
        }

        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64> {
        let mut conn = self.connection().await?;

        let removed: u64 = conn
            .del(keys)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed: {}", e)))?;

        debug!("✓ Redis DEL {} keys ({} removed)", keys.len(), removed);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(key).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS failed for key {}: {}", key, e))
        })?;

        Ok(exists)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let mut conn = self.connection().await?;

        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis SCAN failed: {}", e)))?;

        debug!(
            "✓ Redis SCAN {} MATCH {} -> {} keys, next {}",
            cursor,
            pattern,
            keys.len(),
            next
        );
        Ok((next, keys))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn.hget(key, field).await.map_err(|e| {
            Error::BackendError(format!("Redis HGET failed for {} {}: {}", key, field, e))
        })?;

        Ok(value)
    }

    async fn hget_all(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut conn = self.connection().await?;

        let fields: HashMap<String, Vec<u8>> = conn.hgetall(key).await.map_err(|e| {
            Error::BackendError(format!("Redis HGETALL failed for key {}: {}", key, e))
        })?;

        Ok(fields.into_iter().collect())
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut conn = self.connection().await?;

        let values: Vec<Option<Vec<u8>>> = redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis HMGET failed for key {}: {}", key, e)))?;

        debug!("✓ Redis HMGET {} ({} fields)", key, fields.len());
        Ok(values)
    }

    async fn hscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<(String, Vec<u8>)>)> {
        let mut conn = self.connection().await?;

        // HSCAN replies with a flat [field, value, field, value, ...] array.
        let (next, flat): (u64, Vec<Vec<u8>>) = redis::cmd("HSCAN")
            .arg(key)
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis HSCAN failed for key {}: {}", key, e)))?;

        let pairs = flat
            .chunks_exact(2)
            .map(|pair| (String::from_utf8_lossy(&pair[0]).into_owned(), pair[1].clone()))
            .collect();
        Ok((next, pairs))
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.hset_multiple::<_, _, _, ()>(key, fields.as_slice())
            .await
            .map_err(|e| Error::BackendError(format!("Redis HSET failed for key {}: {}", key, e)))?;

        debug!("✓ Redis HSET {} ({} fields)", key, fields.len());
        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64> {
        let mut conn = self.connection().await?;

        let removed: u64 = conn
            .hdel(key, fields)
            .await
            .map_err(|e| Error::BackendError(format!("Redis HDEL failed for key {}: {}", key, e)))?;

        Ok(removed)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.hexists(key, field).await.map_err(|e| {
            Error::BackendError(format!("Redis HEXISTS failed for {} {}: {}", key, field, e))
        })?;

        Ok(exists)
    }

    async fn execute(&self, commands: &[Command]) -> Result<Vec<Reply>> {
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            match command {
                Command::Set {
                    key,
                    value,
                    ttl: Some(ttl),
                } => {
                    pipe.pset_ex(key, value, ttl_millis(*ttl));
                }
                Command::Set {
                    key,
                    value,
                    ttl: None,
                } => {
                    pipe.set(key, value);
                }
                Command::HSet { key, field, value } => {
                    pipe.hset(key, field, value);
                }
                Command::HMSet { key, fields } => {
                    pipe.hset_multiple(key, fields.as_slice());
                }
                Command::HDel { key, fields } => {
                    pipe.hdel(key, fields);
                }
                Command::Del { keys } => {
                    pipe.del(keys);
                }
                Command::Expire { key, ttl } => {
                    pipe.pexpire(key, expire_millis(*ttl));
                }
                Command::IncrBy { key, amount } => {
                    pipe.incr(key, *amount);
                }
                Command::DecrBy { key, amount } => {
                    pipe.decr(key, *amount);
                }
            }
        }

        let values: Vec<Value> = pipe
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis EXEC failed: {}", e)))?;

        debug!("✓ Redis EXEC {} commands", commands.len());
        Ok(values.into_iter().map(Reply::from).collect())
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG" || pong.contains("PONG"))
    }
}

/// Connector yielding a pinged [`RedisStore`], for use with
/// [`connect_with_retry`](crate::bootstrap::connect_with_retry).
#[derive(Clone, Debug)]
pub struct RedisConnector {
    config: RedisConfig,
}

impl RedisConnector {
    pub fn new(config: RedisConfig) -> Self {
        RedisConnector { config }
    }
}

impl Connector for RedisConnector {
    type Connection = RedisStore;

    async fn connect(&self) -> Result<RedisStore> {
        RedisStore::connect(self.config.clone()).await
    }

    fn describe(&self) -> String {
        format!("redis {}:{}", self.config.host, self.config.port)
    }
}

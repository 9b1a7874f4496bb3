//! # cache-repository
//!
//! Typed, generic cache repositories over Redis.
//!
//! ## Features
//!
//! - **Typed values:** a repository stores one value type `V`; scalars are
//!   kept as plain text, anything implementing [`CacheEntity`] as JSON
//! - **Hash and scalar operations:** `get`/`set`/`del`/`exists`, non-blocking
//!   key scans, and the `h*` family over hash fields
//! - **Overridable:** concrete repositories override single operations through
//!   [`CacheRepository`] and inherit the rest
//! - **Pipelines:** chain writes with [`CachePipeline`] and submit them
//!   atomically in one round trip; the first invalid call sticks
//! - **Cancellation:** every call runs under the repository's [`Context`]
//! - **Backends:** Redis (pooled, feature `redis`) and an in-process store
//!   (feature `inmemory`) for tests and local development
//!
//! ## Quick Start
//!
//! ```
//! use cache_repository::{BaseRepository, CacheEntity, Context, InMemoryStore};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl CacheEntity for User {}
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cache_repository::Result<()> {
//! let store = InMemoryStore::new();
//! let users: BaseRepository<User, _> =
//!     BaseRepository::new(store.clone(), Context::with_timeout(Duration::from_secs(5)));
//!
//! let alice = User { id: 1, name: "Alice".to_string() };
//! users.set("user:1", &alice, Some(Duration::from_secs(600))).await?;
//! assert_eq!(users.get("user:1").await?, Some(alice));
//! assert_eq!(users.get("user:2").await?, None);
//!
//! let counters: BaseRepository<i64, _> = BaseRepository::new(store, Context::background());
//! counters
//!     .new_pipeline()
//!     .set("visits", &0i64, None)
//!     .incr_by("visits", 3)
//!     .exec_and_discard()
//!     .await?;
//! assert_eq!(counters.get("visits").await?, Some(3));
//! # Ok(())
//! # }
//! ```
//!
//! ## Connecting to Redis
//!
//! ```no_run
//! use cache_repository::backend::{RedisConfig, RedisConnector};
//! use cache_repository::bootstrap::{connect_with_retry, RetryPolicy};
//! use cache_repository::{config, BaseRepository, Context};
//!
//! # async fn example() -> cache_repository::Result<()> {
//! let _ = config::load_env_file(None);
//! let connector = RedisConnector::new(RedisConfig::from_env()?);
//! let store = connect_with_retry(&connector, &RetryPolicy::default()).await?;
//!
//! let names: BaseRepository<String, _> = BaseRepository::new(store, Context::background());
//! let keys = names.get_keys_by_pattern("session:*").await?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod repository;
pub mod serialization;

// Re-exports for convenience
#[cfg(feature = "inmemory")]
pub use backend::InMemoryStore;
pub use backend::{Command, KeyValueStore, Reply};
pub use context::Context;
pub use entity::CacheEntity;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::CachePipeline;
pub use repository::{BaseRepository, CacheRepository};
pub use serialization::{CacheValue, ValueKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

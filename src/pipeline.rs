//! Command pipeline with sticky-error semantics.
//!
//! A [`CachePipeline`] queues commands and submits them as one atomic batch.
//! Each builder method validates its own arguments; the first failure is
//! kept and every later call becomes a no-op, so a chain can be built
//! without checking errors in between:
//!
//! ```
//! use cache_repository::{BaseRepository, Context, InMemoryStore};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cache_repository::Result<()> {
//! let repo: BaseRepository<String, _> =
//!     BaseRepository::new(InMemoryStore::new(), Context::background());
//!
//! let replies = repo
//!     .new_pipeline()
//!     .hset("user:1", "name", &"alice".to_string())
//!     .expire("user:1", Duration::from_secs(300))
//!     .incr_by("user:count", 1)
//!     .exec()
//!     .await?;
//! assert_eq!(replies.len(), 3);
//!
//! let err = repo
//!     .new_pipeline()
//!     .hset("user:1", "", &"nobody".to_string())
//!     .incr_by("user:count", 1)
//!     .exec()
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.kind(), cache_repository::ErrorKind::Validation);
//! # Ok(())
//! # }
//! ```

use crate::backend::{Command, KeyValueStore, Reply};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::repository::require_non_empty;
use crate::serialization::{encode, CacheValue};
use std::time::Duration;

/// Batch of commands bound to a store and a context.
///
/// Consuming builder: every method takes and returns `self`.
#[must_use = "a pipeline does nothing until exec() is awaited"]
pub struct CachePipeline<S> {
    store: S,
    ctx: Context,
    commands: Vec<Command>,
    err: Option<Error>,
}

impl<S: KeyValueStore> CachePipeline<S> {
    pub fn new(store: S, ctx: Context) -> Self {
        CachePipeline {
            store,
            ctx,
            commands: Vec::new(),
            err: None,
        }
    }

    fn push(mut self, build: impl FnOnce() -> Result<Command>) -> Self {
        if self.err.is_some() {
            return self;
        }
        match build() {
            Ok(command) => self.commands.push(command),
            Err(e) => {
                debug!(
                    "Pipeline holds error after {} queued commands: {}",
                    self.commands.len(),
                    e
                );
                self.err = Some(e);
            }
        }
        self
    }

    /// Queue a `SET`. A `ttl` of `None` or zero means no expiration.
    pub fn set<T: CacheValue>(self, key: &str, value: &T, ttl: Option<Duration>) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            Ok(Command::Set {
                key: key.to_string(),
                value: encode(value)?,
                ttl: ttl.filter(|d| !d.is_zero()),
            })
        })
    }

    pub fn hset<T: CacheValue>(self, key: &str, field: &str, value: &T) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            require_non_empty(field, "field")?;
            Ok(Command::HSet {
                key: key.to_string(),
                field: field.to_string(),
                value: encode(value)?,
            })
        })
    }

    /// Queue an `HSET` of several fields. An empty field map is an error.
    pub fn hmset<'a, T, I, F>(self, key: &str, fields: I) -> Self
    where
        T: CacheValue + 'a,
        I: IntoIterator<Item = (F, &'a T)>,
        F: AsRef<str>,
    {
        self.push(|| {
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
            Ok(Command::HMSet {
                key: key.to_string(),
                fields: encoded,
            })
        })
    }

    pub fn hdel(self, key: &str, fields: &[&str]) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            if fields.is_empty() {
                return Err(Error::ValidationError(
                    "at least one field must be specified".to_string(),
                ));
            }
            for field in fields {
                require_non_empty(field, "field")?;
            }
            Ok(Command::HDel {
                key: key.to_string(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            })
        })
    }

    pub fn del(self, keys: &[&str]) -> Self {
        self.push(|| {
            if keys.is_empty() {
                return Err(Error::ValidationError(
                    "at least one key must be specified".to_string(),
                ));
            }
            for key in keys {
                require_non_empty(key, "key")?;
            }
            Ok(Command::Del {
                keys: keys.iter().map(|k| k.to_string()).collect(),
            })
        })
    }

    pub fn expire(self, key: &str, ttl: Duration) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            Ok(Command::Expire {
                key: key.to_string(),
                ttl,
            })
        })
    }

    pub fn incr_by(self, key: &str, amount: i64) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            Ok(Command::IncrBy {
                key: key.to_string(),
                amount,
            })
        })
    }

    pub fn decr_by(self, key: &str, amount: i64) -> Self {
        self.push(|| {
            require_non_empty(key, "key")?;
            Ok(Command::DecrBy {
                key: key.to_string(),
                amount,
            })
        })
    }

    /// The error held by the pipeline, if any.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Submit the batch atomically in one round trip.
    ///
    /// Replies are returned in submission order. An empty batch returns an
    /// empty list without contacting the store.
    ///
    /// # Errors
    /// - the held error, without contacting the store
    /// - `Error::BackendError` if the store fails or any command is rejected
    /// - `Error::Cancelled` if the context is done
    pub async fn exec(self) -> Result<Vec<Reply>> {
        let CachePipeline {
            store,
            ctx,
            commands,
            err,
        } = self;

        if let Some(e) = err {
            return Err(e);
        }
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let replies = ctx.run("EXEC", store.execute(&commands)).await?;
        debug!("✓ Pipeline executed {} commands", commands.len());
        Ok(replies)
    }

    /// Like [`exec`](Self::exec) but drops the replies.
    ///
    /// # Errors
    /// Same as [`exec`](Self::exec).
    pub async fn exec_and_discard(self) -> Result<()> {
        self.exec().await.map(|_| ())
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::backend::InMemoryStore;
    use std::collections::BTreeMap;

    fn pipeline(store: &InMemoryStore) -> CachePipeline<InMemoryStore> {
        CachePipeline::new(store.clone(), Context::background())
    }

    #[tokio::test]
    async fn test_replies_in_submission_order() {
        let store = InMemoryStore::new();

        let replies = pipeline(&store)
            .set("counter", &10i64, None)
            .incr_by("counter", 5)
            .decr_by("counter", 3)
            .hset("h", "f", &"v".to_string())
            .exec()
            .await
            .unwrap();

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0], Reply::Ok);
        assert_eq!(replies[1].as_int(), Some(15));
        assert_eq!(replies[2].as_int(), Some(12));
        assert_eq!(store.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_sticky_error_short_circuits() {
        let store = InMemoryStore::new();

        let pipe = pipeline(&store)
            .set("a", &1u8, None)
            .hset("h", "", &"v".to_string())
            .set("b", &2u8, None)
            .del(&["a"]);

        assert_eq!(pipe.len(), 1);
        assert!(matches!(pipe.error(), Some(Error::ValidationError(_))));

        let err = pipe.exec().await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
        assert_eq!(store.round_trips(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pipeline_skips_store() {
        let store = InMemoryStore::new();
        let replies = pipeline(&store).exec().await.unwrap();
        assert!(replies.is_empty());
        assert_eq!(store.round_trips(), 0);
    }

    #[test]
    fn test_argument_validation() {
        let store = InMemoryStore::new();

        let value = "v".to_string();

        assert!(pipeline(&store).set("", &value, None).error().is_some());
        assert!(pipeline(&store).hset("", "f", &value).error().is_some());
        assert!(pipeline(&store).hset("h", "", &value).error().is_some());
        assert!(pipeline(&store).del(&[]).error().is_some());
        assert!(pipeline(&store).del(&["a", ""]).error().is_some());
        assert!(pipeline(&store).hdel("h", &[]).error().is_some());
        assert!(pipeline(&store).hdel("h", &["f", ""]).error().is_some());
        assert!(pipeline(&store).hdel("", &["f"]).error().is_some());
        assert!(pipeline(&store).expire("", Duration::from_secs(1)).error().is_some());
        assert!(pipeline(&store).incr_by("", 1).error().is_some());
        assert!(pipeline(&store).decr_by("", 1).error().is_some());

        let empty: BTreeMap<String, String> = BTreeMap::new();
        assert!(pipeline(&store).hmset("h", &empty).error().is_some());
        assert!(pipeline(&store).hmset("", [("f", &value)]).error().is_some());
        assert!(pipeline(&store)
            .hmset("h", [("f", &value), ("", &value)])
            .error()
            .is_some());

        let rejected = pipeline(&store).del(&["a", ""]);
        assert!(rejected.is_empty());
        assert!(matches!(rejected.error(), Some(Error::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_unbounded_expire_keeps_key() {
        let store = InMemoryStore::new();

        let replies = pipeline(&store)
            .set("k", &"v".to_string(), None)
            .expire("k", Duration::MAX)
            .exec()
            .await
            .unwrap();

        assert_eq!(replies[1].as_int(), Some(1));
        assert!(store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_hmset_and_hdel() {
        let store = InMemoryStore::new();
        let fields: BTreeMap<&str, u32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();

        pipeline(&store)
            .hmset("h", fields.iter().map(|(k, v)| (*k, v)))
            .hdel("h", &["a", "c"])
            .exec_and_discard()
            .await
            .unwrap();

        let remaining = store.hget_all("h").await.unwrap();
        assert_eq!(remaining, vec![("b".to_string(), b"2".to_vec())]);
    }

    #[tokio::test]
    async fn test_failing_command_fails_exec() {
        let store = InMemoryStore::new();
        store.set("text", b"abc".to_vec(), None).await.unwrap();

        let err = pipeline(&store)
            .incr_by("text", 1)
            .exec()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BackendError(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_store() {
        let store = InMemoryStore::new();
        let ctx = Context::background();
        ctx.cancel();

        let err = CachePipeline::new(store.clone(), ctx)
            .set("k", &"v".to_string(), None)
            .exec()
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(store.round_trips(), 0);
    }
}

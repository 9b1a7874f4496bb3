//! Serialization policy for cached values.
//!
//! Every value stored by a repository is written in one of two forms:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬──────────────────────┐
//! │ Kind         │ Types                        │ Stored bytes         │
//! ├──────────────┼──────────────────────────────┼──────────────────────┤
//! │ Primitive    │ String, bool, char, ints,    │ natural text form    │
//! │              │ floats, Vec<u8>              │ (Vec<u8> verbatim)   │
//! │ Structured   │ anything implementing        │ JSON                 │
//! │              │ CacheEntity                  │                      │
//! └──────────────┴──────────────────────────────┴──────────────────────┘
//! ```
//!
//! The kind is an associated constant of [`CacheValue`], so a repository
//! learns it once when it is built and never inspects values at runtime.
//! Storing scalars as plain text keeps them readable by other clients and
//! usable by commands such as `INCRBY`.
//!
//! # Example
//!
//! ```rust
//! use cache_repository::serialization::{decode, encode, ValueKind};
//! use cache_repository::CacheEntity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl CacheEntity for User {}
//!
//! # fn main() -> cache_repository::Result<()> {
//! assert_eq!(encode(&42u64)?, b"42");
//!
//! let user = User { id: 1, name: "Alice".to_string() };
//! let bytes = encode(&user)?;
//! assert_eq!(bytes, br#"{"id":1,"name":"Alice"}"#);
//!
//! let back: User = decode(&bytes, ValueKind::Structured)?;
//! assert_eq!(user, back);
//! # Ok(())
//! # }
//! ```

mod primitive;

use crate::entity::CacheEntity;
use crate::error::{Error, Result};
use std::fmt;

/// Storage representation chosen for a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Rendered as its natural text form.
    Primitive,
    /// Encoded as JSON.
    Structured,
}

impl ValueKind {
    pub fn is_primitive(self) -> bool {
        matches!(self, ValueKind::Primitive)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Primitive => write!(f, "primitive"),
            ValueKind::Structured => write!(f, "structured"),
        }
    }
}

/// A type that can be stored by a cache repository.
///
/// Primitive implementations are provided for the standard scalar types.
/// Structured types get this trait through [`CacheEntity`]; do not implement
/// it by hand unless you need a custom wire form.
pub trait CacheValue: Sized + Send + Sync {
    /// How values of this type are stored.
    const KIND: ValueKind;

    /// Convert the value to the bytes written to the store.
    ///
    /// # Errors
    /// `Error::SerializationError` if the value cannot be encoded.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Rebuild a value from stored bytes.
    ///
    /// # Errors
    /// - `Error::TypeMismatch` for primitive text that is not a valid `Self`
    /// - `Error::DeserializationError` for malformed JSON
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl<T: CacheEntity> CacheValue for T {
    const KIND: ValueKind = ValueKind::Structured;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::DeserializationError(e.to_string()))
    }
}

/// Whether values of type `V` are stored as plain text.
pub fn is_primitive<V: CacheValue>() -> bool {
    V::KIND.is_primitive()
}

/// Encode a value for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if JSON encoding of a structured value fails.
pub fn encode<V: CacheValue>(value: &V) -> Result<Vec<u8>> {
    value.to_bytes().map_err(|e| {
        error!("Cache value encoding failed ({}): {}", V::KIND, e);
        e
    })
}

/// Decode stored bytes as `V`, given the kind the caller recorded for it.
///
/// # Errors
///
/// - `Error::TypeMismatch`: `kind` differs from `V::KIND`, or primitive text
///   does not parse as `V`
/// - `Error::DeserializationError`: malformed JSON for a structured `V`
pub fn decode<V: CacheValue>(bytes: &[u8], kind: ValueKind) -> Result<V> {
    if kind != V::KIND {
        warn!(
            "Decode kind mismatch: declared {}, target type is {}",
            kind,
            V::KIND
        );
        return Err(Error::kind_mismatch(kind, V::KIND));
    }

    V::from_bytes(bytes).map_err(|e| {
        error!("Cache value decoding failed ({}): {}", kind, e);
        e
    })
}

//! Plain-text storage for scalar types.

use super::{CacheValue, ValueKind};
use crate::error::{Error, Result};
use std::any::type_name;
use std::str::FromStr;

fn as_text<T>(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::TypeMismatch {
        expected: type_name::<T>().to_string(),
        found: "non-UTF-8 bytes".to_string(),
    })
}

fn parse_text<T: FromStr>(bytes: &[u8]) -> Result<T> {
    let text = as_text::<T>(bytes)?;
    text.parse::<T>().map_err(|_| Error::TypeMismatch {
        expected: type_name::<T>().to_string(),
        found: format!("{:?}", text),
    })
}

macro_rules! display_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheValue for $ty {
                const KIND: ValueKind = ValueKind::Primitive;

                fn to_bytes(&self) -> Result<Vec<u8>> {
                    Ok(self.to_string().into_bytes())
                }

                fn from_bytes(bytes: &[u8]) -> Result<Self> {
                    parse_text::<$ty>(bytes)
                }
            }
        )*
    };
}

display_primitive!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
);

impl CacheValue for String {
    const KIND: ValueKind = ValueKind::Primitive;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        as_text::<String>(bytes).map(str::to_string)
    }
}

// Redis clients commonly write booleans as 1/0.
impl CacheValue for bool {
    const KIND: ValueKind = ValueKind::Primitive;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_string().into_bytes())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"1" => Ok(true),
            b"0" => Ok(false),
            _ => parse_text::<bool>(bytes),
        }
    }
}

impl CacheValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Primitive;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

//! Record Module
//!
//! Fixed-size values that can live in a store slot.
//!
//! ## Encoding
//! Records are encoded with bincode's fixed-width little-endian format, so a
//! struct is the concatenation of its fields and every integer keeps its
//! width. Every type stored as a key or value must encode to exactly `SIZE`
//! bytes; container records (blocks) may encode shorter and are zero-padded
//! up to their slot size.
//!
//! ```text
//! u32            → 4 bytes LE
//! i64            → 8 bytes LE (two's complement)
//! FixedStr<N>    → N raw bytes, zero padded
//! Pair<K, V>     → K bytes ‖ V bytes
//! ```

mod fixed_str;
mod pair;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ShelfError};

pub use fixed_str::FixedStr;
pub use pair::Pair;

/// A value with a fixed on-disk footprint
pub trait Record: Serialize + DeserializeOwned {
    /// Number of bytes reserved for one encoded value
    const SIZE: usize;
}

macro_rules! impl_record_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();
            }
        )*
    };
}

impl_record_for_int!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Encode `value` into `buf`, zero-filling whatever it does not use
pub(crate) fn encode_into<T: Record>(value: &T, buf: &mut [u8]) -> Result<()> {
    let bytes = bincode::serialize(value)
        .map_err(|e| ShelfError::Serialization(e.to_string()))?;

    if bytes.len() > buf.len() {
        return Err(ShelfError::Serialization(format!(
            "Encoded record is {} bytes, slot holds {}",
            bytes.len(),
            buf.len()
        )));
    }

    buf[..bytes.len()].copy_from_slice(&bytes);
    buf[bytes.len()..].fill(0);
    Ok(())
}

/// Decode a record from the start of `buf` (trailing padding is ignored)
pub(crate) fn decode<T: Record>(buf: &[u8]) -> Result<T> {
    bincode::deserialize(buf).map_err(|e| ShelfError::Serialization(e.to_string()))
}

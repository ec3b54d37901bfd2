//! Encoding and decoding of fixed-size index records.
//!
//! Each record on disk is `next_ptr (4) | key (key_size_max, zero-padded) | value_ptr (4) |
//! value_size (4)` — see the index file layout in the crate's top-level documentation. This
//! module only knows how to turn that layout into/from an [`IndexRecord`]; it has no notion of
//! buckets, chains, or free-lists (that's [`crate::index`]).

use std::convert::TryInto;

use crate::error::Error;

/// Number of bytes occupied by the non-key fields of an index record: `next_ptr`, `value_ptr`,
/// `value_size`, each a 32-bit little-endian integer.
pub const RECORD_OVERHEAD: usize = 4 + 4 + 4;

/// Returns the fixed size in bytes of a single index record for the given `key_size_max`.
pub fn record_size(key_size_max: usize) -> usize {
    key_size_max + RECORD_OVERHEAD
}

/// A decoded index record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub next_ptr: u32,
    /// The key, already trimmed of its zero padding (a live record's key never contains a zero
    /// byte, so the first zero byte in the on-disk field is unambiguously the end of the key).
    pub key: Vec<u8>,
    pub value_ptr: u32,
    pub value_size: u32,
}

impl IndexRecord {
    /// True for a record whose key field is all zeros, i.e. a free-list slot.
    pub fn is_free(&self) -> bool {
        self.key.is_empty()
    }
}

/// Decodes a record from its raw on-disk byte layout.
///
/// `raw` must be exactly `record_size(key_size_max)` bytes, laid out as
/// `next_ptr | key | value_ptr | value_size`.
pub fn decode_record(raw: &[u8], key_size_max: usize) -> IndexRecord {
    assert_eq!(raw.len(), record_size(key_size_max));
    let next_ptr = u32::from_le_bytes(raw[0..4].try_into().unwrap());
    let key_field = &raw[4..4 + key_size_max];
    let key_len = key_field
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(key_size_max);
    let key = key_field[..key_len].to_vec();
    let value_ptr_off = 4 + key_size_max;
    let value_ptr = u32::from_le_bytes(raw[value_ptr_off..value_ptr_off + 4].try_into().unwrap());
    let value_size = u32::from_le_bytes(
        raw[value_ptr_off + 4..value_ptr_off + 8]
            .try_into()
            .unwrap(),
    );
    IndexRecord {
        next_ptr,
        key,
        value_ptr,
        value_size,
    }
}

/// Encodes the key field alone, zero-padded to `key_size_max` bytes.
///
/// `key.len()` must not exceed `key_size_max`; this is enforced by the caller ([`crate::db::Db`])
/// before a key ever reaches this layer.
pub fn encode_key_field(key: &[u8], key_size_max: usize) -> Result<Vec<u8>, Error> {
    if key.len() > key_size_max {
        return Err(Error::KeySize {
            actual: key.len(),
            max: key_size_max,
        });
    }
    let mut field = crate::io_primitives::try_zeroed_vec(key_size_max)?;
    field[..key.len()].copy_from_slice(key);
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_full_record(
        next_ptr: u32,
        key: &[u8],
        key_size_max: usize,
        value_ptr: u32,
        value_size: u32,
    ) -> Vec<u8> {
        let mut buf = Vec::with_capacity(record_size(key_size_max));
        buf.extend_from_slice(&next_ptr.to_le_bytes());
        buf.extend_from_slice(&encode_key_field(key, key_size_max).unwrap());
        buf.extend_from_slice(&value_ptr.to_le_bytes());
        buf.extend_from_slice(&value_size.to_le_bytes());
        buf
    }

    #[test]
    fn roundtrip_live_record() {
        let raw = encode_full_record(12, b"hello", 8, 99, 5);
        let decoded = decode_record(&raw, 8);
        assert_eq!(decoded.next_ptr, 12);
        assert_eq!(decoded.key, b"hello");
        assert_eq!(decoded.value_ptr, 99);
        assert_eq!(decoded.value_size, 5);
        assert!(!decoded.is_free());
    }

    #[test]
    fn free_record_has_empty_key() {
        let raw = encode_full_record(7, b"", 8, 0, 0);
        let decoded = decode_record(&raw, 8);
        assert!(decoded.is_free());
        assert_eq!(decoded.next_ptr, 7);
    }

    #[test]
    fn key_longer_than_max_is_rejected() {
        let err = encode_key_field(b"toolongkey", 4).unwrap_err();
        assert!(matches!(err, Error::KeySize { actual: 10, max: 4 }));
    }

    #[test]
    fn key_exactly_at_max_has_no_trailing_nul_to_trim() {
        let raw = encode_full_record(0, b"abcd", 4, 1, 1);
        let decoded = decode_record(&raw, 4);
        assert_eq!(decoded.key, b"abcd");
    }
}

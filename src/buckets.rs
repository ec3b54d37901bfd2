//! The hash bucket head table.
//!
//! Unlike an in-memory table rebuilt from a startup scan, the bucket heads here live inside the
//! index file itself: offset 4 holds bucket 0's head, and buckets `1..hash_buckets` follow
//! contiguously, each a 32-bit pointer. Bucket 0's cell and the free-list head (offset 0) are
//! both just "a 32-bit pointer cell at a known offset" — the same primitive that backs every
//! `next_ptr` in the file — so this table is a thin, bounds-checked address calculator rather
//! than a cache.

use crate::error::Error;
use crate::io_primitives::U32_SIZE;

/// Bounds-checked accessor for the on-disk hash bucket head array.
pub struct BucketTable {
    count: usize,
}

impl BucketTable {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Byte offset of the head cell for `bucket`.
    pub fn offset(&self, bucket: usize) -> Result<u64, Error> {
        if bucket >= self.count {
            return Err(Error::BucketOutOfBounds {
                bucket,
                count: self.count,
            });
        }
        Ok(U32_SIZE as u64 * (bucket as u64 + 1))
    }

    /// Total byte size of the free-list head plus every bucket head cell.
    pub fn header_size(&self) -> u64 {
        U32_SIZE as u64 * (self.count as u64 + 1)
    }
}

//! The index file manager.
//!
//! Owns the fixed-record index file: the free-list head at offset 0, the hash bucket head array
//! starting at offset 4 (see [`crate::buckets`]), and a pool of fixed-size
//! [`recordlist::IndexRecord`]s reachable by byte offset. This module has no notion of hashing or
//! of the data heap; it only knows how to allocate, free, read and write index slots, and how to
//! walk the two singly-linked lists (bucket chains, free-list) that are threaded through the same
//! `next_ptr` field.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::debug;

use crate::buckets::BucketTable;
use crate::error::Error;
use crate::io_primitives::{
    extend_with_zeros, file_len, read_bytes_at, read_u32_at, write_bytes_at, write_u32_at,
};
use crate::recordlist::{decode_record, encode_key_field, record_size, IndexRecord};

/// Offset 0 of the index file, in the special role of "the cell whose `next_ptr` is the free-list
/// head". Treating it as just another pointer cell unifies pushing/popping the free-list with
/// updating a bucket head or a predecessor's `next_ptr`: all three are "write a 32-bit pointer at
/// a known offset".
const NULL_PTR: u32 = 0;

pub struct IndexFile {
    file: File,
    pub buckets: BucketTable,
    key_size_max: usize,
}

impl IndexFile {
    /// Creates a new index file at `path`, initialized with `hash_buckets + 1` zero pointers (the
    /// free-list head plus one head per bucket).
    pub fn create<P: AsRef<Path>>(path: P, key_size_max: usize, hash_buckets: usize) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::open_file(path, e))?;
        let buckets = BucketTable::new(hash_buckets);
        extend_with_zeros(&mut file, buckets.header_size() as usize)?;
        debug!(
            "created index file {:?} with {} buckets",
            path, hash_buckets
        );
        Ok(Self {
            file,
            buckets,
            key_size_max,
        })
    }

    /// Opens an existing index file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, key_size_max: usize, hash_buckets: usize) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::open_file(path, e))?;
        debug!("opened index file {:?}", path);
        Ok(Self {
            file,
            buckets: BucketTable::new(hash_buckets),
            key_size_max,
        })
    }

    pub fn record_size(&self) -> usize {
        record_size(self.key_size_max)
    }

    pub fn file_size(&mut self) -> Result<u64, Error> {
        file_len(&mut self.file)
    }

    pub fn read_bucket_head(&mut self, bucket: usize) -> Result<u32, Error> {
        let file = &mut self.file;
        let offset = self.buckets.offset(bucket)?;
        read_u32_at(file, offset)
    }

    pub fn write_bucket_head(&mut self, bucket: usize, value: u32) -> Result<(), Error> {
        let offset = self.buckets.offset(bucket)?;
        write_u32_at(&mut self.file, offset, value)
    }

    /// The byte offset of bucket `bucket`'s head cell — usable as a "predecessor pointer" with
    /// [`Self::read_next_ptr`]/[`Self::write_next_ptr`].
    pub fn bucket_head_cell(&self, bucket: usize) -> Result<u32, Error> {
        Ok(self.buckets.offset(bucket)? as u32)
    }

    /// Reads the `next_ptr` field at `ptr`. `ptr == 0` reads the free-list head.
    pub fn read_next_ptr(&mut self, ptr: u32) -> Result<u32, Error> {
        read_u32_at(&mut self.file, ptr as u64)
    }

    /// Writes the `next_ptr` field at `ptr`. `ptr == 0` writes the free-list head.
    pub fn write_next_ptr(&mut self, ptr: u32, next: u32) -> Result<(), Error> {
        write_u32_at(&mut self.file, ptr as u64, next)
    }

    pub fn read_record(&mut self, ptr: u32) -> Result<IndexRecord, Error> {
        let raw = read_bytes_at(&mut self.file, ptr as u64, self.record_size())?;
        Ok(decode_record(&raw, self.key_size_max))
    }

    /// Writes `key`, `value_ptr` and `value_size` into the record at `ptr`, preserving whatever
    /// `next_ptr` is already there. Key bytes shorter than `key_size_max` leave the remainder of
    /// the key field as it was (zero, for a freshly allocated slot).
    pub fn write_record(
        &mut self,
        ptr: u32,
        key: &[u8],
        value_ptr: u32,
        value_size: u32,
    ) -> Result<(), Error> {
        let key_offset = ptr as u64 + 4;
        write_bytes_at(&mut self.file, key_offset, key)?;
        let value_offset = key_offset + self.key_size_max as u64;
        let mut tail = Vec::with_capacity(8);
        tail.extend_from_slice(&value_ptr.to_le_bytes());
        tail.extend_from_slice(&value_size.to_le_bytes());
        write_bytes_at(&mut self.file, value_offset, &tail)
    }

    /// Allocates an index slot, preferring a reused free-list entry over extending the file.
    pub fn allocate_slot(&mut self) -> Result<u32, Error> {
        let head = self.read_next_ptr(NULL_PTR)?;
        if head != NULL_PTR {
            let new_head = self.read_next_ptr(head)?;
            self.write_next_ptr(NULL_PTR, new_head)?;
            self.write_next_ptr(head, NULL_PTR)?;
            debug!("reused free index slot at {}", head);
            Ok(head)
        } else {
            let record_size = self.record_size();
            let offset = extend_with_zeros(&mut self.file, record_size)?;
            debug!("extended index file for new slot at {}", offset);
            Ok(offset as u32)
        }
    }

    /// Pushes `ptr` onto the free-list and clears its key field. The caller must have already
    /// spliced `ptr` out of its bucket chain.
    pub fn free_slot(&mut self, ptr: u32) -> Result<(), Error> {
        let old_head = self.read_next_ptr(NULL_PTR)?;
        self.write_next_ptr(NULL_PTR, ptr)?;
        self.write_next_ptr(ptr, old_head)?;
        let empty_key = encode_key_field(&[], self.key_size_max)?;
        write_bytes_at(&mut self.file, ptr as u64 + 4, &empty_key)?;
        Ok(())
    }
}

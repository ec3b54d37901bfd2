//! The store facade.
//!
//! Composes the index file manager ([`crate::index`]) and the data heap manager
//! ([`crate::data`]) into the public key-value operations: `create`, `open`, `read`, `write`,
//! `delete`, and `close`. This is the only module that knows about keys, hashing, and chained
//! bucket traversal — the two managers it drives only know about slots and spans.

use std::path::{Path, PathBuf};

use log::debug;

use crate::data::DataFile;
use crate::error::Error;
use crate::hash::bucket_of;
use crate::index::IndexFile;
use crate::recordlist::IndexRecord;
use crate::superblock::{self, Options};

/// A predecessor pointer for a chain walk: either a bucket head cell or a previously visited
/// slot's `next_ptr` field. Both are "a 32-bit pointer cell at a known offset" (see
/// [`crate::index::IndexFile::read_next_ptr`]/`write_next_ptr`), so a single type represents
/// both — there is no structural difference between "update the bucket head" and "update a
/// predecessor's `next_ptr`".
type PredecessorCell = u32;

/// An open key-value store, backed by three sibling files on disk: `<path>.db.super`,
/// `<path>.db.index`, and `<path>.db.data`.
pub struct Db {
    options: Options,
    hash_buckets: u32,
    index: IndexFile,
    data: DataFile,
}

fn sibling_path(path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl Db {
    /// Creates a new database at `path`, writing the superblock and initializing empty index and
    /// data files. Fails if `options` violates the limits in §6 of the specification.
    pub fn create(path: impl AsRef<Path>, options: Options) -> Result<Self, Error> {
        options.validate()?;
        let path = path.as_ref();
        let super_path = sibling_path(path, ".db.super");
        let index_path = sibling_path(path, ".db.index");
        let data_path = sibling_path(path, ".db.data");

        superblock::write(&super_path, &options)?;
        let hash_buckets = options.hash_buckets.max(1);
        let index = IndexFile::create(&index_path, options.key_size_max as usize, hash_buckets as usize)?;
        let data = DataFile::create(&data_path)?;

        debug!("created database {:?} ({})", path, options.db_name);
        Ok(Self {
            options,
            hash_buckets,
            index,
            data,
        })
    }

    /// Opens an existing database at `path`. All three sibling files must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let super_path = sibling_path(path, ".db.super");
        let index_path = sibling_path(path, ".db.index");
        let data_path = sibling_path(path, ".db.data");

        let options = superblock::read(&super_path)?;
        let hash_buckets = options.hash_buckets.max(1);
        let index = IndexFile::open(&index_path, options.key_size_max as usize, hash_buckets as usize)?;
        let data = DataFile::open(&data_path)?;

        debug!("opened database {:?} ({})", path, options.db_name);
        Ok(Self {
            options,
            hash_buckets,
            index,
            data,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn index_size(&mut self) -> Result<u64, Error> {
        self.index.file_size()
    }

    pub fn data_size(&mut self) -> Result<u64, Error> {
        self.data.file_size()
    }

    /// Flushes and relinquishes the three open files. The same effect happens implicitly on
    /// `Drop`; this method exists so a caller can observe close-time I/O errors instead of having
    /// them silently swallowed by a destructor.
    pub fn close(self) -> Result<(), Error> {
        // Every state-mutating operation already flushes before returning, so there is nothing
        // left to commit here; dropping `self` releases the file handles.
        Ok(())
    }

    fn bucket(&self, key: &[u8]) -> usize {
        bucket_of(key, self.hash_buckets)
    }

    /// Walks the bucket chain for `key`, returning the predecessor cell and, if found, the
    /// offset and decoded record of the matching slot.
    fn find(&mut self, key: &[u8]) -> Result<(PredecessorCell, Option<(u32, IndexRecord)>), Error> {
        let bucket = self.bucket(key);
        let mut predecessor = self.index.bucket_head_cell(bucket)?;
        let mut ptr = self.index.read_bucket_head(bucket)?;

        while ptr != 0 {
            let record = self.index.read_record(ptr)?;
            if record.key == key {
                return Ok((predecessor, Some((ptr, record))));
            }
            predecessor = ptr;
            ptr = record.next_ptr;
        }
        Ok((predecessor, None))
    }

    fn validate_sizes(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let key_size_max = self.options.key_size_max as usize;
        if key.len() > key_size_max {
            return Err(Error::KeySize {
                actual: key.len(),
                max: key_size_max,
            });
        }
        if value.len() > self.options.data_size_max as usize {
            return Err(Error::ValueSize {
                actual: value.len(),
                max: self.options.data_size_max as usize,
            });
        }
        if let Some(pos) = value.iter().position(|&b| b == 0) {
            return Err(Error::ValueZeroByte(pos));
        }
        Ok(())
    }

    /// Returns the value stored for `key`, or `None` if the chain ends without a match.
    pub fn read(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let (_, found) = self.find(key)?;
        match found {
            Some((_, record)) => {
                let value = self.data.read_span(record.value_ptr, record.value_size)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Inserts or replaces the value stored for `key`.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.validate_sizes(key, value)?;
        let (predecessor, found) = self.find(key)?;

        match found {
            Some((ptr, record)) => self.update(ptr, &record, value),
            None => self.insert(predecessor, key, value),
        }
    }

    /// Insert path (§4.4): allocate a slot and a span, write them, then splice the new slot onto
    /// the chain as the last durable step. On failure after a resource has been acquired, the
    /// acquired resources are freed in reverse order before the error is returned, so a failed
    /// write never leaks an index slot or a data span.
    fn insert(&mut self, predecessor: PredecessorCell, key: &[u8], value: &[u8]) -> Result<(), Error> {
        let slot = self.index.allocate_slot()?;

        let span = match self.data.allocate_span(value.len() as u32) {
            Ok(span) => span,
            Err(e) => {
                self.index.free_slot(slot)?;
                return Err(e);
            }
        };

        if let Err(e) = self.data.write_span(span, value) {
            let _ = self.data.free_span(span, value.len() as u32);
            self.index.free_slot(slot)?;
            return Err(e);
        }

        if let Err(e) = self.index.write_record(slot, key, span, value.len() as u32) {
            let _ = self.data.free_span(span, value.len() as u32);
            self.index.free_slot(slot)?;
            return Err(e);
        }

        // Last durable step: until this write lands, `slot` and `span` are unreferenced garbage
        // but not yet visible from any bucket chain.
        self.index.write_next_ptr(predecessor, slot)?;
        Ok(())
    }

    /// Update path (§4.4): free the old span, allocate and write a new one, and rewrite the
    /// record in place, keeping the slot's position and `next_ptr`. Not crash-atomic: a failure
    /// after the free and before the rewrite leaves the record pointing at re-zeroed data (§9).
    fn update(&mut self, ptr: u32, record: &IndexRecord, value: &[u8]) -> Result<(), Error> {
        self.data.free_span(record.value_ptr, record.value_size)?;
        let span = self.data.allocate_span(value.len() as u32)?;
        self.data.write_span(span, value)?;
        self.index.write_record(ptr, &record.key, span, value.len() as u32)
    }

    /// Deletes `key`, returning `Error::NoKey` if it was not present.
    ///
    /// The deleted slot's `next_ptr` is captured before `free_index_slot` overwrites it, so the
    /// predecessor is spliced using the slot's pre-free state even though the splice and the
    /// free happen as two separate writes.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), Error> {
        let (predecessor, found) = self.find(key)?;
        let (ptr, record) = found.ok_or(Error::NoKey)?;
        let old_next = record.next_ptr;

        self.data.free_span(record.value_ptr, record.value_size)?;
        self.index.write_next_ptr(predecessor, old_next)?;
        self.index.free_slot(ptr)?;
        Ok(())
    }
}

//! The superblock: the ASCII parameter manifest written once at creation and read verbatim on
//! open.
//!
//! This is deliberately kept separate from the binary index/data managers: it is a parameter
//! manifest, not part of the hot path, so it gets its own small, whitespace-token format instead
//! of sharing the little-endian binary layout the rest of the engine uses.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::Error;

/// Upper bound on `db_name`'s length, enforced both on write and on read. The original engine
/// parsed this token with unbounded width into a fixed buffer; this implementation bounds the
/// read explicitly instead of relying on the caller never producing a long name.
pub const DB_NAME_MAX: usize = 255;

/// Exclusive upper bound on `key_size_max`.
pub const KEY_SIZE_MAX_LIMIT: usize = 255;

/// Exclusive upper bound on `data_size_max`.
pub const DATA_SIZE_MAX_LIMIT: u32 = u32::MAX;

/// The five fields of the superblock, held in memory for the lifetime of an open store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub db_name: String,
    pub key_size_max: u16,
    pub data_size_max: u32,
    pub hash_buckets: u32,
    pub items_max: u32,
}

impl Options {
    /// Validates the limits from §6 before anything is written to disk.
    pub fn validate(&self) -> Result<(), Error> {
        if self.db_name.is_empty() || self.db_name.len() > DB_NAME_MAX {
            return Err(Error::InvalidDbName(
                self.db_name.clone(),
                "must be 1..=255 bytes",
            ));
        }
        if self.db_name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidDbName(
                self.db_name.clone(),
                "must not contain whitespace",
            ));
        }
        if self.key_size_max as usize >= KEY_SIZE_MAX_LIMIT {
            return Err(Error::InvalidDbName(
                self.db_name.clone(),
                "key_size_max must be < 255",
            ));
        }
        if self.data_size_max >= DATA_SIZE_MAX_LIMIT {
            return Err(Error::InvalidDbName(
                self.db_name.clone(),
                "data_size_max must be < 2^32 - 1",
            ));
        }
        Ok(())
    }

    /// `R`, the fixed byte size of one index record.
    pub fn record_size(&self) -> usize {
        crate::recordlist::record_size(self.key_size_max as usize)
    }
}

/// Serializes `options` as whitespace-separated ASCII tokens and writes them to `path`.
pub fn write<P: AsRef<Path>>(path: P, options: &Options) -> Result<(), Error> {
    options.validate()?;
    let contents = format!(
        "{} {} {} {} {}\n",
        options.db_name,
        options.key_size_max,
        options.data_size_max,
        options.hash_buckets,
        options.items_max
    );
    let path = path.as_ref();
    fs::write(path, contents).map_err(|e| Error::open_file(path, e))
}

/// Parses the five whitespace-separated tokens back into an [`Options`].
pub fn read<P: AsRef<Path>>(path: P) -> Result<Options, Error> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::open_file(path, e))?;
    let mut tokens = contents.split_whitespace();

    let mut db_name = tokens
        .next()
        .ok_or(Error::MalformedSuperblock("missing db_name"))?
        .to_string();
    if db_name.len() > DB_NAME_MAX {
        warn!(
            "superblock db_name at {:?} is {} bytes, truncating to {}",
            path,
            db_name.len(),
            DB_NAME_MAX
        );
        db_name.truncate(DB_NAME_MAX);
    }

    let key_size_max = tokens
        .next()
        .ok_or(Error::MalformedSuperblock("missing key_size_max"))?
        .parse()
        .map_err(|_| Error::MalformedSuperblock("key_size_max is not a valid u16"))?;
    let data_size_max = tokens
        .next()
        .ok_or(Error::MalformedSuperblock("missing data_size_max"))?
        .parse()
        .map_err(|_| Error::MalformedSuperblock("data_size_max is not a valid u32"))?;
    let hash_buckets = tokens
        .next()
        .ok_or(Error::MalformedSuperblock("missing hash_buckets"))?
        .parse()
        .map_err(|_| Error::MalformedSuperblock("hash_buckets is not a valid u32"))?;
    let items_max = tokens
        .next()
        .ok_or(Error::MalformedSuperblock("missing items_max"))?
        .parse()
        .map_err(|_| Error::MalformedSuperblock("items_max is not a valid u32"))?;

    Ok(Options {
        db_name,
        key_size_max,
        data_size_max,
        hash_buckets,
        items_max,
    })
}

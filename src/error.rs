use std::io;

use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
///
/// Each I/O variant wraps the [`io::Error`] of the specific primitive that failed (seek, read,
/// write, flush, open) rather than collapsing them behind a single `#[from] io::Error`, so that a
/// caller comparing on the variant can recover the same seek/read/write/flush distinction the
/// on-disk state machines rely on internally.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open file {path:?}")]
    OpenFile {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("seek failed")]
    Seek(#[source] io::Error),
    #[error("read failed")]
    Read(#[source] io::Error),
    #[error("write failed")]
    Write(#[source] io::Error),
    #[error("flush failed")]
    Flush(#[source] io::Error),

    #[error("key not found")]
    NoKey,

    #[error("bucket {bucket} is out of bounds for a table of {count} buckets")]
    BucketOutOfBounds { bucket: usize, count: usize },

    #[error("key size {actual} exceeds configured maximum {max}")]
    KeySize { actual: usize, max: usize },
    #[error("value size {actual} exceeds configured maximum {max}")]
    ValueSize { actual: usize, max: usize },
    #[error("value contains a zero byte at offset {0}, which is reserved as heap padding")]
    ValueZeroByte(usize),
    #[error("key is empty")]
    EmptyKey,

    #[error("caller-supplied buffer is too small")]
    BufSize,

    #[error("memory allocation failed")]
    Alloc,

    #[error("db_name {0:?} is invalid: {1}")]
    InvalidDbName(String, &'static str),
    #[error("superblock is malformed: {0}")]
    MalformedSuperblock(&'static str),

    /// Reserved for future internal invariants; never constructed today.
    #[error("critical internal invariant violated")]
    Critical,
    #[error("internal logic error")]
    Logic,
    #[error("operation not implemented")]
    Unimplemented,
}

impl Error {
    pub(crate) fn open_file(path: impl Into<std::path::PathBuf>, source: io::Error) -> Self {
        Error::OpenFile {
            path: path.into(),
            source,
        }
    }
}

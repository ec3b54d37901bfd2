//! The data heap manager.
//!
//! Owns the data file: an unstructured byte region where live values are runs of non-zero bytes
//! and free regions are runs of zero bytes. There is no second free-list here — unlike the index
//! file, the data heap is reused purely by scanning, which keeps its on-disk shape trivial (and
//! trivially crash-resistant: a run of zeros is unambiguously free) at the cost of an O(file_size)
//! allocation.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::{debug, warn};

use crate::error::Error;
use crate::io_primitives::{extend_with_zeros, read_bytes_at, write_bytes_at};

/// Emit a warning once a first-fit scan has walked this many candidate free/live regions without
/// finding a fit, per the deployment-awareness note about O(file_size) allocation.
const SCAN_WARN_THRESHOLD: usize = 64;

pub struct DataFile {
    file: File,
}

impl DataFile {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::open_file(path, e))?;
        debug!("created data file {:?}", path);
        Ok(Self { file })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::open_file(path, e))?;
        debug!("opened data file {:?}", path);
        Ok(Self { file })
    }

    pub fn file_size(&mut self) -> Result<u64, Error> {
        crate::io_primitives::file_len(&mut self.file)
    }

    pub fn read_span(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>, Error> {
        read_bytes_at(&mut self.file, ptr as u64, len as usize)
    }

    pub fn write_span(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), Error> {
        write_bytes_at(&mut self.file, ptr as u64, bytes)
    }

    /// Overwrites `len` bytes at `ptr` with zeros, returning the span to the free pool.
    pub fn free_span(&mut self, ptr: u32, len: u32) -> Result<(), Error> {
        let zeros = crate::io_primitives::try_zeroed_vec(len as usize)?;
        write_bytes_at(&mut self.file, ptr as u64, &zeros)
    }

    /// First-fit, zero-run allocation of a span of `len` bytes.
    ///
    /// Scans from the start of the file: skips the current live (non-zero) region, then measures
    /// the following free (zero) run. If that run is at least `len + 2` bytes, the span starts
    /// one byte in (`start + 1`), leaving a guaranteed zero byte of padding on both sides so the
    /// scan can always tell live from free without any other bookkeeping. If no run fits, the
    /// file is extended by exactly `len` zero bytes.
    pub fn allocate_span(&mut self, len: u32) -> Result<u32, Error> {
        let file_size = self.file_size()?;
        let mut pos: u64 = 0;
        let mut regions_scanned = 0usize;

        while pos < file_size {
            let byte = self.read_span(pos as u32, 1)?[0];
            if byte != 0 {
                // Skip the live region.
                pos += 1;
                while pos < file_size && self.read_span(pos as u32, 1)?[0] != 0 {
                    pos += 1;
                }
                continue;
            }

            let start = pos;
            while pos < file_size && self.read_span(pos as u32, 1)?[0] == 0 {
                pos += 1;
            }
            let end = pos;
            regions_scanned += 1;

            if end - start >= u64::from(len) + 2 {
                if regions_scanned > SCAN_WARN_THRESHOLD {
                    warn!(
                        "data heap allocation scanned {} regions before finding a {}-byte fit; \
                         consider compaction or a larger heap",
                        regions_scanned, len
                    );
                }
                return Ok(start as u32 + 1);
            }
        }

        let offset = extend_with_zeros(&mut self.file, len as usize)?;
        debug!("extended data file for new {}-byte span at {}", len, offset);
        Ok(offset as u32)
    }
}

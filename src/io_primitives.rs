//! Positioned reads and writes of fixed-width little-endian integers and raw byte runs.
//!
//! Every higher-level component in this crate is expressed in terms of these primitives: a seek
//! to an absolute offset followed by a read or a write, with an explicit flush after any write
//! that mutates persistent state. Reads never extend a file; writes past the current end extend
//! it, exactly like the underlying `fseek`/`fread`/`fwrite` calls this layer wraps.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::Error;

pub const U32_SIZE: usize = 4;

/// Reads a 32-bit little-endian integer at the given absolute offset.
pub fn read_u32_at(file: &mut File, offset: u64) -> Result<u32, Error> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::Seek)?;
    let mut buf = [0u8; U32_SIZE];
    file.read_exact(&mut buf).map_err(Error::Read)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes a 32-bit little-endian integer at the given absolute offset and flushes.
pub fn write_u32_at(file: &mut File, offset: u64, value: u32) -> Result<(), Error> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::Seek)?;
    file.write_all(&value.to_le_bytes()).map_err(Error::Write)?;
    file.flush().map_err(Error::Flush)?;
    Ok(())
}

/// Reads exactly `len` bytes at the given absolute offset.
pub fn read_bytes_at(file: &mut File, offset: u64, len: usize) -> Result<Vec<u8>, Error> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::Seek)?;
    let mut buf = try_zeroed_vec(len)?;
    file.read_exact(&mut buf).map_err(Error::Read)?;
    Ok(buf)
}

/// Writes `bytes` at the given absolute offset and flushes.
pub fn write_bytes_at(file: &mut File, offset: u64, bytes: &[u8]) -> Result<(), Error> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::Seek)?;
    file.write_all(bytes).map_err(Error::Write)?;
    file.flush().map_err(Error::Flush)?;
    Ok(())
}

/// Appends `len` zero bytes at the end of the file and returns the offset at which the
/// extension began. Flushes before returning.
pub fn extend_with_zeros(file: &mut File, len: usize) -> Result<u64, Error> {
    let start = file.seek(SeekFrom::End(0)).map_err(Error::Seek)?;
    let zeros = try_zeroed_vec(len)?;
    file.write_all(&zeros).map_err(Error::Write)?;
    file.flush().map_err(Error::Flush)?;
    Ok(start)
}

/// Returns the current length of the file in bytes.
pub fn file_len(file: &mut File) -> Result<u64, Error> {
    file.seek(SeekFrom::End(0)).map_err(Error::Seek)
}

/// Allocates a zero-filled buffer of the given length, surfacing an allocation failure as
/// [`Error::Alloc`] instead of aborting the process, the idiomatic analogue of the original
/// engine's `malloc`-failure path.
pub fn try_zeroed_vec(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Alloc)?;
    buf.resize(len, 0);
    Ok(buf)
}

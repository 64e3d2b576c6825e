//! Raw memory blocks for the snapshot module.
//!
//! Blocks are byte-for-byte dumps of the internal arrays. The only check
//! made here is the size.

use crate::error::{BankingError, Result};

/// Copy `src` into a snapshot buffer of the same size.
pub fn block_to_snapshot(name: &'static str, src: &[u8], buf: &mut [u8]) -> Result<()> {
    check_size(name, src.len(), buf.len())?;
    buf.copy_from_slice(src);
    Ok(())
}

/// Restore `dst` from a snapshot buffer of the same size.
pub fn block_from_snapshot(name: &'static str, buf: &[u8], dst: &mut [u8]) -> Result<()> {
    check_size(name, dst.len(), buf.len())?;
    dst.copy_from_slice(buf);
    Ok(())
}

fn check_size(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(BankingError::SnapshotSize {
            name,
            expected,
            actual,
        })
    }
}

/// Pack two nibble-wide color RAM halves into one byte per cell.
///
/// The low nibble comes from `lo`, the high nibble from `hi`.
pub fn pack_nibbles(lo: &[u8], hi: &[u8], buf: &mut [u8]) -> Result<()> {
    check_size("color RAM", lo.len(), buf.len())?;
    check_size("color RAM", hi.len(), buf.len())?;
    for ((out, l), h) in buf.iter_mut().zip(lo).zip(hi) {
        *out = (l & 0x0F) | ((h & 0x0F) << 4);
    }
    Ok(())
}

/// Inverse of [`pack_nibbles`].
pub fn unpack_nibbles(buf: &[u8], lo: &mut [u8], hi: &mut [u8]) -> Result<()> {
    check_size("color RAM", lo.len(), buf.len())?;
    check_size("color RAM", hi.len(), buf.len())?;
    for ((byte, l), h) in buf.iter().zip(lo.iter_mut()).zip(hi.iter_mut()) {
        *l = byte & 0x0F;
        *h = byte >> 4;
    }
    Ok(())
}

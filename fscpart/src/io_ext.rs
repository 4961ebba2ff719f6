// SPDX-License-Identifier: MIT

//! Sector-addressed BlockIO helpers to avoid `* sector_size` everywhere,
//! with overflow checks.

use fscio::prelude::*;

/// Offset = lba * sector_size (with overflow-check)
#[inline]
fn lba_offset(lba: u64, sector_size: u64) -> BlockIOResult<u64> {
    lba.checked_mul(sector_size)
        .ok_or(BlockIOError::Other("lba_offset overflow"))
}

pub trait BlockIOLbaExt: BlockIO {
    /// Reads `buf.len()` bytes starting from an LBA (offset = lba * sector_size).
    #[inline]
    fn read_at_lba(&mut self, lba: u64, sector_size: u64, buf: &mut [u8]) -> BlockIOResult {
        let off = lba_offset(lba, sector_size)?;
        self.read_at(off, buf)
    }

    /// Reads a struct `T` starting from an LBA.
    #[inline]
    fn read_struct_lba<T>(&mut self, lba: u64, sector_size: u64) -> BlockIOResult<T>
    where
        T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.read_struct::<T>(off)
    }

    /// Writes a struct `T` starting from an LBA.
    #[inline]
    fn write_struct_lba<T>(&mut self, lba: u64, sector_size: u64, val: &T) -> BlockIOResult
    where
        T: zerocopy::IntoBytes + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.write_struct::<T>(off, val)
    }
}

impl<T: BlockIO + ?Sized> BlockIOLbaExt for T {}

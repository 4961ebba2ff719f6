// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
#[macro_use]
mod macros;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod file;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::BlockIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(feature = "std")]
    pub use super::file::StdBlockIO;
}

// Internal use
use errors::*;

// Constants

/// Size of the internal scratch buffer used by struct reads.
/// Matches the filesystem block size, so one block always fits.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Block IO abstraction trait.
///
/// Offsets are relative to the current partition offset, so filesystem code
/// only ever deals with partition-relative positions.
/// Implementations may target RAM or files.
pub trait BlockIO {
    /// Writes `data` at `offset` (partition relative).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult;

    /// Reads exactly `buf.len()` bytes into `buf` from `offset` (partition relative).
    ///
    /// A read that cannot be satisfied in full is an error.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BlockIOResult;

    /// Moves the partition window. Returns the new offset.
    fn set_offset(&mut self, partition_offset: u64) -> u64;

    /// Absolute byte offset of the partition window.
    fn partition_offset(&self) -> u64;
}

/// Extension helpers for BlockIO.
///
/// Provides:
/// - block-number addressed reads
/// - big-endian primitive reads/writes (read_u32_be_at, ...)
/// - zero fill
pub trait BlockIOExt: BlockIO {
    /// Reads block `block` of `block_size` bytes into `buf`.
    ///
    /// `buf` may be shorter than a block (partial read of the block head).
    #[inline(always)]
    fn read_block(&mut self, block: u32, block_size: usize, buf: &mut [u8]) -> BlockIOResult {
        let offset = (block as u64)
            .checked_mul(block_size as u64)
            .ok_or(BlockIOError::OutOfBounds)?;
        self.read_at(offset, buf)
    }

    /// Writes `buf` at the start of block `block`.
    #[inline(always)]
    fn write_block(&mut self, block: u32, block_size: usize, buf: &[u8]) -> BlockIOResult {
        let offset = (block as u64)
            .checked_mul(block_size as u64)
            .ok_or(BlockIOError::OutOfBounds)?;
        self.write_at(offset, buf)
    }

    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> BlockIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Big-endian read/write helpers for u16, u32, u64
    blockio_impl_primitive_be!(u16, u32, u64);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}

/// Extension trait for reading and writing structs using zerocopy.
///
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait BlockIOStructExt: BlockIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> BlockIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(BlockIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BlockIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> BlockIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: BlockIO + ?Sized> BlockIOStructExt for T {}

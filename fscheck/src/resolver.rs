// SPDX-License-Identifier: MIT

//! Resolves the block references of an inode through up to two levels of
//! indirection.
//!
//! Every level reads into its own buffer, so a visitor may freely use the
//! same IO between calls.

use alloc::{vec, vec::Vec};

use fscio::prelude::*;

use crate::{constant::*, errors::*};

/// Role of a block reached from an inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Holds file or directory content.
    Data,
    /// Holds block numbers.
    Indirect,
}

/// Blocks reached from one inode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefTally {
    pub data: u32,
    pub indirect: u32,
}

impl RefTally {
    /// Content bytes covered by the data blocks.
    #[inline]
    pub fn data_bytes(&self) -> u64 {
        self.data as u64 * BLOCK_SIZE_U64
    }
}

/// Splits a pointer block into its block numbers.
#[inline]
pub fn block_numbers(buf: &[u8]) -> impl Iterator<Item = u32> + '_ {
    buf.chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
}

/// Walks the 8 reference slots of an inode in on-disk order.
///
/// Zero entries are holes. Any nonzero reference at or past `block_count`
/// fails with `OutOfRangeBlock` before it is read. Pointer blocks are
/// visited before the blocks they list.
pub fn walk_refs<IO, F>(
    io: &mut IO,
    block_count: u32,
    refs: &[u32; INODE_REFS],
    mut visit: F,
) -> FsckResult<RefTally>
where
    IO: BlockIO + ?Sized,
    F: FnMut(u32, RefKind) -> FsckResult<()>,
{
    let mut tally = RefTally::default();

    for &b in refs[..DIRECT_REFS].iter().filter(|&&b| b != 0) {
        ensure!(b < block_count, FsckError::OutOfRangeBlock(b));
        visit(b, RefKind::Data)?;
        tally.data += 1;
    }

    let single = refs[SINGLE_INDIRECT_SLOT];
    if single != 0 {
        walk_indirect(io, block_count, single, 1, &mut visit, &mut tally)?;
    }

    let double = refs[DOUBLE_INDIRECT_SLOT];
    if double != 0 {
        walk_indirect(io, block_count, double, 2, &mut visit, &mut tally)?;
    }

    Ok(tally)
}

fn walk_indirect<IO, F>(
    io: &mut IO,
    block_count: u32,
    block: u32,
    level: u8,
    visit: &mut F,
    tally: &mut RefTally,
) -> FsckResult<()>
where
    IO: BlockIO + ?Sized,
    F: FnMut(u32, RefKind) -> FsckResult<()>,
{
    ensure!(block < block_count, FsckError::OutOfRangeBlock(block));
    visit(block, RefKind::Indirect)?;
    tally.indirect += 1;

    let mut buf = vec![0u8; BLOCK_SIZE];
    io.read_block(block, BLOCK_SIZE, &mut buf)?;

    for entry in block_numbers(&buf).filter(|&b| b != 0) {
        if level > 1 {
            walk_indirect(io, block_count, entry, level - 1, visit, tally)?;
        } else {
            ensure!(entry < block_count, FsckError::OutOfRangeBlock(entry));
            visit(entry, RefKind::Data)?;
            tally.data += 1;
        }
    }
    Ok(())
}

/// Data blocks of an inode in logical order.
pub fn data_blocks<IO: BlockIO + ?Sized>(
    io: &mut IO,
    block_count: u32,
    refs: &[u32; INODE_REFS],
) -> FsckResult<Vec<u32>> {
    let mut blocks = Vec::new();
    walk_refs(io, block_count, refs, |b, kind| {
        if kind == RefKind::Data {
            blocks.push(b);
        }
        Ok(())
    })?;
    Ok(blocks)
}

// SPDX-License-Identifier: MIT

//! Free-list walk.
//!
//! The list starts in the superblock, after the cached free inode numbers.
//! Each node is `count` followed by `count` block numbers; entry 0, when
//! nonzero, is the next node (itself a free block) and is honored even when
//! `count` is 0. The chain is followed iteratively.

use alloc::vec;

use fscio::prelude::*;

use crate::{
    constant::*, context::CheckContext, errors::*, meta::Eos32Meta, resolver::block_numbers,
};

/// Outcome of a free-list walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FreeListSummary {
    /// Link blocks followed after the superblock node.
    pub links: u32,
    /// Nonzero entries accounted, link blocks included.
    pub entries: u64,
    /// The chain returned to a block already on the list.
    pub looped: bool,
}

#[inline]
fn word_at(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Accounts every block on the free list into `ctx.blocks`.
pub fn walk_free_list<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &Eos32Meta,
    ctx: &mut CheckContext,
) -> FsckResult<FreeListSummary> {
    let mut summary = FreeListSummary::default();
    let mut buf = vec![0u8; BLOCK_SIZE];
    io.read_block(SUPER_BLOCK, BLOCK_SIZE, &mut buf)?;

    let head = meta.free_list_head_offset();
    ensure!(
        head + 4 <= BLOCK_SIZE_U64,
        FsckError::Invalid("Free-list head lies outside the superblock")
    );
    let mut offset = head as usize;

    loop {
        let start = offset + 4;
        // The link word is read whatever the count says.
        let mut next = 0;
        if start + 4 <= BLOCK_SIZE {
            let link = word_at(&buf, start);
            if link != 0 {
                let seen = ctx.blocks.account_free(link)?;
                summary.entries += 1;
                if seen > 1 {
                    summary.looped = true;
                } else {
                    next = link;
                }
            }
        }

        // Only the entries that physically fit in the block are read.
        let count = (word_at(&buf, offset) as usize).min((BLOCK_SIZE - start) / 4);
        if count > 1 {
            for block in block_numbers(&buf[start + 4..start + count * 4]) {
                if block != 0 {
                    ctx.blocks.account_free(block)?;
                    summary.entries += 1;
                }
            }
        }

        if next == 0 {
            break;
        }
        io.read_block(next, BLOCK_SIZE, &mut buf)?;
        offset = 0;
        summary.links += 1;
    }

    Ok(summary)
}

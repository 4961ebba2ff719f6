// SPDX-License-Identifier: MIT

//! Per-block reference counters fed by the inode scan and the free-list walk.

use alloc::{vec, vec::Vec};

use crate::errors::*;

/// Reference counters of one block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockUse {
    /// References from inodes (direct, indirect and pointer blocks).
    pub file_refs: u32,
    /// Occurrences in the free list (link blocks included).
    pub free_refs: u32,
}

impl BlockUse {
    /// Exactly one counter is 1 and the other 0.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        matches!((self.file_refs, self.free_refs), (1, 0) | (0, 1))
    }
}

/// Block accounting table, one entry per partition block.
#[derive(Debug, Clone)]
pub struct BlockTable {
    entries: Vec<BlockUse>,
}

impl BlockTable {
    pub fn new(block_count: u32) -> Self {
        Self {
            entries: vec![BlockUse::default(); block_count as usize],
        }
    }

    #[inline]
    pub fn block_count(&self) -> u32 {
        self.entries.len() as u32
    }

    #[inline]
    fn slot(&mut self, block: u32) -> FsckResult<&mut BlockUse> {
        ensure!(block != 0, FsckError::OutOfRangeBlock(block));
        self.entries
            .get_mut(block as usize)
            .ok_or(FsckError::OutOfRangeBlock(block))
    }

    /// Counts a reference from a file. Returns the new file counter.
    #[inline]
    pub fn account_file(&mut self, block: u32) -> FsckResult<u32> {
        let e = self.slot(block)?;
        e.file_refs = e.file_refs.saturating_add(1);
        Ok(e.file_refs)
    }

    /// Counts a free-list occurrence. Returns the new free counter.
    #[inline]
    pub fn account_free(&mut self, block: u32) -> FsckResult<u32> {
        let e = self.slot(block)?;
        e.free_refs = e.free_refs.saturating_add(1);
        Ok(e.free_refs)
    }

    #[inline]
    pub fn get(&self, block: u32) -> BlockUse {
        self.entries
            .get(block as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Entries of `[first, block_count)` with their block numbers, ascending.
    pub fn region(&self, first: u32) -> impl Iterator<Item = (u32, BlockUse)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .skip(first as usize)
            .map(|(b, u)| (b as u32, *u))
    }

    /// Sum of all free-list occurrences.
    pub fn free_total(&self) -> u64 {
        self.entries.iter().map(|u| u.free_refs as u64).sum()
    }
}

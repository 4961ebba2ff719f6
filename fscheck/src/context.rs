// SPDX-License-Identifier: MIT

use alloc::{vec, vec::Vec};

use crate::{
    accounting::BlockTable, checker::WalkerStats, meta::Eos32Meta, types::InodeKind,
};

/// Values derived for one inode slot during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InodeDerived {
    pub kind: InodeKind,
    /// Link count stored in the inode.
    pub stored_links: u32,
    /// Size stored in the inode.
    pub stored_size: u32,
    /// Directory entries found for the inode.
    pub observed_links: u32,
    /// Bytes covered by the inode's data blocks.
    pub computed_size: u64,
}

/// Tables owned by one check run.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub blocks: BlockTable,
    pub inodes: Vec<InodeDerived>,
    pub stats: WalkerStats,
}

impl CheckContext {
    pub fn new(meta: &Eos32Meta) -> Self {
        Self {
            blocks: BlockTable::new(meta.block_count),
            inodes: vec![InodeDerived::default(); meta.inode_count() as usize],
            stats: WalkerStats::new(),
        }
    }

    #[inline]
    pub fn inode(&self, ino: u32) -> Option<&InodeDerived> {
        self.inodes.get(ino as usize)
    }

    #[inline]
    pub fn inode_count(&self) -> u32 {
        self.inodes.len() as u32
    }

    /// Free inode slots, slot 0 excluded.
    pub fn free_inode_slots(&self) -> u32 {
        self.inodes
            .iter()
            .skip(1)
            .filter(|d| d.kind == InodeKind::Free)
            .count() as u32
    }
}

// SPDX-License-Identifier: MIT

use fscio::prelude::*;

use crate::{constant::*, errors::*, types::RawSuperblock};

/// Geometry and superblock summary of one EOS32 partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eos32Meta {
    /// Blocks in the partition window.
    pub block_count: u32,
    /// Size recorded by the formatter, in blocks.
    pub fs_size: u32,
    pub inode_blocks: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
    /// Cached free inode numbers preceding the free-list head.
    pub free_list_skip: u32,
}

impl Eos32Meta {
    /// Reads the superblock of a partition holding `block_count` blocks.
    ///
    /// Fails with `FsTooSmall` when the partition cannot hold the boot block,
    /// the superblock and the inode table it declares.
    pub fn from_io<IO: BlockIO + ?Sized>(io: &mut IO, block_count: u32) -> FsckResult<Self> {
        ensure!(
            block_count >= INODE_TABLE_START,
            FsckError::FsTooSmall {
                blocks: block_count,
                needed: INODE_TABLE_START as u64,
            }
        );

        let sb: RawSuperblock = io.read_struct(SUPER_BLOCK as u64 * BLOCK_SIZE_U64)?;
        let meta = Self {
            block_count,
            fs_size: sb.fs_size.get(),
            inode_blocks: sb.inode_blocks.get(),
            free_blocks: sb.free_blocks.get(),
            free_inodes: sb.free_inodes.get(),
            free_list_skip: sb.free_list_skip.get(),
        };

        ensure!(
            meta.inode_blocks <= u32::MAX / INODES_PER_BLOCK,
            FsckError::Invalid("Inode table larger than the inode number space")
        );
        let needed = INODE_TABLE_START as u64 + meta.inode_blocks as u64;
        ensure!(
            needed <= block_count as u64,
            FsckError::FsTooSmall {
                blocks: block_count,
                needed,
            }
        );
        Ok(meta)
    }

    /// Number of inode slots (inode 0 included).
    #[inline]
    pub fn inode_count(&self) -> u32 {
        self.inode_blocks * INODES_PER_BLOCK
    }

    /// First block after the inode table.
    #[inline]
    pub fn first_data_block(&self) -> u32 {
        self.inode_blocks + INODE_TABLE_START
    }

    #[inline]
    pub fn data_block_count(&self) -> u32 {
        self.block_count - self.first_data_block()
    }

    /// Block and byte offset of an inode record.
    #[inline]
    pub fn inode_location(&self, ino: u32) -> (u32, usize) {
        (
            ino / INODES_PER_BLOCK + INODE_TABLE_START,
            (ino % INODES_PER_BLOCK) as usize * INODE_SIZE,
        )
    }

    /// Byte offset of the free-list head inside the superblock.
    #[inline]
    pub fn free_list_head_offset(&self) -> u64 {
        SB_FREE_LIST_BASE as u64 + 4 * self.free_list_skip as u64
    }
}

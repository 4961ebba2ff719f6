// SPDX-License-Identifier: MIT

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Fixed head of the superblock (block 1).
///
/// Cached free inode numbers follow at byte 24, `free_list_skip` of them,
/// then the first free-list node.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct RawSuperblock {
    pub magic: U32,
    pub fs_size: U32,
    pub inode_blocks: U32,
    pub free_blocks: U32,
    pub free_inodes: U32,
    pub free_list_skip: U32,
}

impl RawSuperblock {
    pub fn new(fs_size: u32, inode_blocks: u32) -> Self {
        Self {
            magic: U32::new(0),
            fs_size: U32::new(fs_size),
            inode_blocks: U32::new(inode_blocks),
            free_blocks: U32::new(0),
            free_inodes: U32::new(0),
            free_list_skip: U32::new(0),
        }
    }
}

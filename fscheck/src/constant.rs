// SPDX-License-Identifier: MIT

// Geometry
pub const SECTOR_SIZE: usize = 512;
pub const BLOCK_SIZE: usize = 4096;
pub const BLOCK_SIZE_U64: u64 = BLOCK_SIZE as u64;
pub const SECTORS_PER_BLOCK: u32 = (BLOCK_SIZE / SECTOR_SIZE) as u32;

// Fixed blocks
pub const BOOT_BLOCK: u32 = 0;
pub const SUPER_BLOCK: u32 = 1;
pub const INODE_TABLE_START: u32 = 2;

// Superblock field offsets
pub const SB_FREE_LIST_BASE: usize = 24;

// Inodes
pub const INODE_SIZE: usize = 64;
pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / INODE_SIZE) as u32;
pub const INODE_REFS: usize = 8;
pub const DIRECT_REFS: usize = 6;
pub const SINGLE_INDIRECT_SLOT: usize = 6;
pub const DOUBLE_INDIRECT_SLOT: usize = 7;
/// Block numbers held by one indirect block.
pub const REFS_PER_BLOCK: usize = BLOCK_SIZE / 4;
pub const ROOT_INODE: u32 = 1;

// Mode bits
pub const IFMT: u32 = 0o70000;
pub const IFREG: u32 = 0o40000;
pub const IFDIR: u32 = 0o30000;
pub const IFCHR: u32 = 0o20000;
pub const IFBLK: u32 = 0o10000;
pub const IFFREE: u32 = 0o00000;

// Directories
pub const DIRENT_SIZE: usize = 64;
pub const DIRENTS_PER_BLOCK: usize = BLOCK_SIZE / DIRENT_SIZE;
pub const DIRENT_NAME_SIZE: usize = 60;
/// First four name bytes of "." read as a big-endian word.
pub const DOT_SENTINEL: u32 = 0x2E00_0000;
/// First four name bytes of ".." read as a big-endian word.
pub const DOTDOT_SENTINEL: u32 = 0x2E2E_0000;

// Free list
/// Entries per free-list link node written by the formatter (link slot included).
pub const FREE_LIST_NODE_ENTRIES: usize = 500;

// Walk limits
pub const DEFAULT_MAX_DEPTH: u32 = 256;

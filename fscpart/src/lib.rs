// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

mod io_ext;

pub mod errors;
/// Sector-1 partition table (16 big-endian entries).
pub mod table;
/// Partition window selected for a check run.
pub mod window;

pub use io_ext::BlockIOLbaExt;
pub use table::{
    PartEntry, PartKind, PartTable, part_index, read_part_table, write_part_table,
};
pub use window::{PartitionWindow, WindowWarning};

pub const DEFAULT_SECTOR_SIZE: u64 = 512;
/// Sector holding the partition table.
pub const PART_TABLE_SECTOR: u64 = 1;
pub const PART_TABLE_ENTRIES: usize = 16;
/// Sectors per filesystem block (4096 / 512).
pub const SECTORS_PER_BLOCK: u32 = 8;

/// Type code of the checked filesystem.
pub const PART_TYPE_FS: u32 = 0x58;
pub const PART_TYPE_SWAP: u32 = 0x59;
/// Top bit of the type word marks a bootable partition.
pub const PART_FLAG_BOOT: u32 = 0x8000_0000;

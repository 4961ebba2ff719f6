// SPDX-License-Identifier: MIT

use core::fmt;

use fscio::prelude::*;
use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    DEFAULT_SECTOR_SIZE, PART_FLAG_BOOT, PART_TABLE_ENTRIES, PART_TABLE_SECTOR, PART_TYPE_FS,
    PART_TYPE_SWAP, errors::*, io_ext::BlockIOLbaExt, window::PartitionWindow,
};

pub const DESCR_SIZE: usize = 20;

/// On-disk partition entry (32 bytes, big-endian).
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct PartEntry {
    /// Bit 31 = bootable, low 31 bits = type code.
    pub type_word: U32,
    /// First sector.
    pub start: U32,
    /// Sector count.
    pub size: U32,
    pub descr: [u8; DESCR_SIZE],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Empty,
    FileSystem,
    Swap,
    Unknown(u32),
}

impl PartKind {
    #[inline]
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => PartKind::Empty,
            PART_TYPE_FS => PartKind::FileSystem,
            PART_TYPE_SWAP => PartKind::Swap,
            other => PartKind::Unknown(other),
        }
    }
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Empty => "empty",
            PartKind::FileSystem => "EOS32 file system",
            PartKind::Swap => "swap",
            PartKind::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl PartEntry {
    #[inline]
    pub fn new(type_code: u32, bootable: bool, start: u32, size: u32, descr: &str) -> Self {
        let mut d = [0u8; DESCR_SIZE];
        let n = descr.len().min(DESCR_SIZE);
        d[..n].copy_from_slice(&descr.as_bytes()[..n]);
        let flag = if bootable { PART_FLAG_BOOT } else { 0 };
        Self {
            type_word: U32::new((type_code & !PART_FLAG_BOOT) | flag),
            start: U32::new(start),
            size: U32::new(size),
            descr: d,
        }
    }

    #[inline]
    pub fn new_empty() -> Self {
        Self::new(0, false, 0, 0, "")
    }

    #[inline]
    pub fn type_code(&self) -> u32 {
        self.type_word.get() & !PART_FLAG_BOOT
    }

    #[inline]
    pub fn is_bootable(&self) -> bool {
        self.type_word.get() & PART_FLAG_BOOT != 0
    }

    #[inline]
    pub fn kind(&self) -> PartKind {
        PartKind::from_code(self.type_code())
    }

    #[inline]
    pub fn start_sector(&self) -> u32 {
        self.start.get()
    }

    #[inline]
    pub fn sector_count(&self) -> u32 {
        self.size.get()
    }

    /// Description up to the first NUL. Non UTF-8 text yields `"?"`.
    pub fn description(&self) -> &str {
        let end = self
            .descr
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(DESCR_SIZE);
        core::str::from_utf8(&self.descr[..end]).unwrap_or("?")
    }
}

/// The full table stored in sector 1.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct PartTable {
    pub entries: [PartEntry; PART_TABLE_ENTRIES],
}

impl PartTable {
    #[inline]
    pub fn new_empty() -> Self {
        Self {
            entries: [PartEntry::new_empty(); PART_TABLE_ENTRIES],
        }
    }

    /// Validates `index` and returns the partition window of a filesystem entry.
    pub fn select(&self, index: i64) -> PartResult<PartitionWindow> {
        let index = part_index(index)?;
        let entry = &self.entries[index];
        match entry.kind() {
            PartKind::FileSystem => Ok(PartitionWindow::new(
                index,
                entry.start_sector(),
                entry.sector_count(),
            )),
            PartKind::Swap => Err(PartError::Swap { index }),
            _ => Err(PartError::BadType {
                index,
                type_code: entry.type_code(),
            }),
        }
    }
}

impl fmt::Display for PartTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partition table • sector {PART_TABLE_SECTOR}")?;
        writeln!(
            f,
            "  | Id | Code       | Type              | Boot | Start      | Sectors    | Description          |"
        )?;
        for (i, e) in self.entries.iter().enumerate() {
            if e.kind() == PartKind::Empty {
                continue;
            }
            writeln!(
                f,
                "  | {:<2} | 0x{:<8X} | {:<17} | {:<4} | {:>10} | {:>10} | {:<20} |",
                i,
                e.type_code(),
                e.kind(),
                if e.is_bootable() { "yes" } else { "" },
                e.start_sector(),
                e.sector_count(),
                e.description(),
            )?;
        }
        Ok(())
    }
}

pub fn read_part_table<IO: BlockIO + ?Sized>(io: &mut IO) -> PartResult<PartTable> {
    let table: PartTable = io.read_struct_lba(PART_TABLE_SECTOR, DEFAULT_SECTOR_SIZE)?;
    Ok(table)
}

/// Range check of a partition number, usable before the disk is opened.
pub fn part_index(index: i64) -> PartResult<usize> {
    if !(0..PART_TABLE_ENTRIES as i64).contains(&index) {
        return Err(PartError::IllegalNumber(index));
    }
    Ok(index as usize)
}

pub fn write_part_table<IO: BlockIO + ?Sized>(io: &mut IO, table: &PartTable) -> PartResult<()> {
    io.write_struct_lba(PART_TABLE_SECTOR, DEFAULT_SECTOR_SIZE, table)?;
    io.flush()?;
    Ok(())
}

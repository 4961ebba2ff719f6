// SPDX-License-Identifier: MIT

use core::fmt;

use crate::{DEFAULT_SECTOR_SIZE, SECTORS_PER_BLOCK};

/// Partition-relative view of the disk used by a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionWindow {
    pub index: usize,
    pub start_sector: u32,
    pub sector_count: u32,
}

/// Non-fatal geometry remarks about the image and the selected partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowWarning {
    DiskNotSectorMultiple { disk_bytes: u64 },
    NotBlockMultiple { sectors: u32 },
    PastEndOfDisk { end_sector: u64, disk_sectors: u64 },
}

impl fmt::Display for WindowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowWarning::DiskNotSectorMultiple { disk_bytes } => write!(
                f,
                "disk size {disk_bytes} is not a multiple of the sector size"
            ),
            WindowWarning::NotBlockMultiple { sectors } => write!(
                f,
                "file system size ({sectors} sectors) is not a multiple of the block size"
            ),
            WindowWarning::PastEndOfDisk {
                end_sector,
                disk_sectors,
            } => write!(
                f,
                "partition ends at sector {end_sector} but the disk has only {disk_sectors} sectors"
            ),
        }
    }
}

impl PartitionWindow {
    #[inline]
    pub fn new(index: usize, start_sector: u32, sector_count: u32) -> Self {
        Self {
            index,
            start_sector,
            sector_count,
        }
    }

    /// Absolute byte offset of the partition.
    #[inline]
    pub fn byte_offset(&self) -> u64 {
        self.start_sector as u64 * DEFAULT_SECTOR_SIZE
    }

    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.sector_count as u64 * DEFAULT_SECTOR_SIZE
    }

    /// Whole 4 KiB blocks in the partition.
    #[inline]
    pub fn block_count(&self) -> u32 {
        self.sector_count / SECTORS_PER_BLOCK
    }

    #[inline]
    pub fn is_block_aligned(&self) -> bool {
        self.sector_count % SECTORS_PER_BLOCK == 0
    }

    /// Exclusive end sector.
    #[inline]
    pub fn end_sector(&self) -> u64 {
        self.start_sector as u64 + self.sector_count as u64
    }

    /// Geometry warnings for an image of `disk_bytes` bytes.
    pub fn warnings(&self, disk_bytes: u64) -> impl Iterator<Item = WindowWarning> {
        let disk_sectors = disk_bytes / DEFAULT_SECTOR_SIZE;
        let end_sector = self.end_sector();
        [
            (disk_bytes % DEFAULT_SECTOR_SIZE != 0)
                .then_some(WindowWarning::DiskNotSectorMultiple { disk_bytes }),
            (!self.is_block_aligned()).then_some(WindowWarning::NotBlockMultiple {
                sectors: self.sector_count,
            }),
            (end_sector > disk_sectors).then_some(WindowWarning::PastEndOfDisk {
                end_sector,
                disk_sectors,
            }),
        ]
        .into_iter()
        .flatten()
    }
}

impl fmt::Display for PartitionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partition {} • start {} (0x{:X}) • {} sectors • {} blocks",
            self.index,
            self.start_sector,
            self.start_sector,
            self.sector_count,
            self.block_count()
        )
    }
}

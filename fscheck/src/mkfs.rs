// SPDX-License-Identifier: MIT

//! In-memory image builder.
//!
//! Produces well-formed file systems for tests and benches, with hooks to
//! inject the faults the checker reports.

use alloc::{vec, vec::Vec};

use fscio::prelude::*;
use fscpart::{PART_TYPE_FS, PartEntry, PartTable, errors::PartError, write_part_table};
use zerocopy::IntoBytes;

use crate::{
    constant::*,
    errors::*,
    types::{DirEntry, InodeKind, RawInode, RawSuperblock},
};

/// Builds one partition image block by block.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    img: Vec<u8>,
    block_count: u32,
    inode_blocks: u32,
    inodes: Vec<RawInode>,
    used: Vec<bool>,
    next_block: u32,
    extra_free: Vec<u32>,
    free_list_skip: u32,
    fs_size: Option<u32>,
    free_blocks: Option<u32>,
    free_inodes: Option<u32>,
}

impl ImageBuilder {
    /// Empty file system holding only the root directory.
    pub fn new(block_count: u32, inode_blocks: u32) -> MkfsResult<Self> {
        ensure!(
            inode_blocks >= 1 && (INODE_TABLE_START as u64 + inode_blocks as u64) < block_count as u64,
            MkfsError::Invalid("Inode table does not fit the partition")
        );
        let inode_count = (inode_blocks * INODES_PER_BLOCK) as usize;
        let first_data = INODE_TABLE_START + inode_blocks;

        let mut b = Self {
            img: vec![0u8; block_count as usize * BLOCK_SIZE],
            block_count,
            inode_blocks,
            inodes: vec![RawInode::new_zeroed(); inode_count],
            used: vec![false; block_count as usize],
            next_block: first_data,
            extra_free: Vec::new(),
            free_list_skip: 0,
            fs_size: None,
            free_blocks: None,
            free_inodes: None,
        };

        let block = b.alloc_block()?;
        let root = &mut b.inodes[ROOT_INODE as usize];
        *root = RawInode::new(IFDIR | 0o755, 2);
        root.refs[0] = block.into();
        root.size = (BLOCK_SIZE as u32).into();
        b.put_entry(block, 0, ROOT_INODE, b".");
        b.put_entry(block, 1, ROOT_INODE, b"..");
        Ok(b)
    }

    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn first_data_block(&self) -> u32 {
        INODE_TABLE_START + self.inode_blocks
    }

    /// Creates a directory below `parent`.
    pub fn mkdir(&mut self, parent: u32, name: &str) -> MkfsResult<u32> {
        self.expect_dir(parent)?;
        let ino = self.alloc_inode()?;
        let block = self.alloc_block()?;

        let dir = &mut self.inodes[ino as usize];
        *dir = RawInode::new(IFDIR | 0o755, 2);
        dir.refs[0] = block.into();
        dir.size = (BLOCK_SIZE as u32).into();
        self.put_entry(block, 0, ino, b".");
        self.put_entry(block, 1, parent, b"..");

        self.add_entry(parent, name, ino)?;
        self.bump_links(parent);
        Ok(ino)
    }

    /// Creates a regular file of `size` bytes with every block allocated.
    pub fn add_file(&mut self, parent: u32, name: &str, size: u32) -> MkfsResult<u32> {
        self.expect_dir(parent)?;
        let ino = self.alloc_inode()?;
        let blocks = (size as usize).div_ceil(BLOCK_SIZE);
        let refs = self.alloc_content(blocks)?;

        let file = &mut self.inodes[ino as usize];
        *file = RawInode::new(IFREG | 0o644, 1);
        file.size = size.into();
        for (slot, r) in refs.iter().enumerate() {
            file.refs[slot] = (*r).into();
        }
        self.add_entry(parent, name, ino)?;
        Ok(ino)
    }

    /// Creates a character or block special file.
    pub fn mknod(&mut self, parent: u32, name: &str, kind: InodeKind) -> MkfsResult<u32> {
        ensure!(kind.is_special(), MkfsError::Invalid("Not a special file type"));
        self.expect_dir(parent)?;
        let ino = self.alloc_inode()?;
        self.inodes[ino as usize] = RawInode::new(kind.mode_bits() | 0o600, 1);
        self.add_entry(parent, name, ino)?;
        Ok(ino)
    }

    /// Adds a hard link to `ino` and counts it in the inode.
    pub fn link(&mut self, parent: u32, name: &str, ino: u32) -> MkfsResult<()> {
        self.add_entry(parent, name, ino)?;
        self.bump_links(ino);
        Ok(())
    }

    /// Appends a directory entry without touching any link count.
    pub fn add_entry(&mut self, parent: u32, name: &str, ino: u32) -> MkfsResult<()> {
        self.expect_dir(parent)?;
        let dir = self.inodes[parent as usize];

        for (slot, r) in dir.refs().iter().take(DIRECT_REFS).enumerate() {
            let block = match *r {
                0 => {
                    let block = self.alloc_block()?;
                    let d = &mut self.inodes[parent as usize];
                    d.refs[slot] = block.into();
                    d.size = (d.size.get() + BLOCK_SIZE as u32).into();
                    block
                }
                b => b,
            };
            if let Some(index) = self.free_entry_slot(block) {
                self.put_entry(block, index, ino, name.as_bytes());
                return Ok(());
            }
        }
        Err(MkfsError::Invalid("Directory is full"))
    }

    // Fault hooks

    /// Raw access to an inode record.
    pub fn inode_mut(&mut self, ino: u32) -> MkfsResult<&mut RawInode> {
        self.inodes
            .get_mut(ino as usize)
            .ok_or(MkfsError::BadInode(ino))
    }

    pub fn inode(&self, ino: u32) -> MkfsResult<&RawInode> {
        self.inodes.get(ino as usize).ok_or(MkfsError::BadInode(ino))
    }

    pub fn set_ref(&mut self, ino: u32, slot: usize, block: u32) -> MkfsResult<()> {
        ensure!(slot < INODE_REFS, MkfsError::Invalid("Reference slot out of range"));
        self.inode_mut(ino)?.refs[slot] = block.into();
        Ok(())
    }

    pub fn set_links(&mut self, ino: u32, nlink: u32) -> MkfsResult<()> {
        self.inode_mut(ino)?.nlink = nlink.into();
        Ok(())
    }

    pub fn set_size(&mut self, ino: u32, size: u32) -> MkfsResult<()> {
        self.inode_mut(ino)?.size = size.into();
        Ok(())
    }

    pub fn set_mode(&mut self, ino: u32, mode: u32) -> MkfsResult<()> {
        self.inode_mut(ino)?.mode = mode.into();
        Ok(())
    }

    /// Allocates a block that no file and no free-list node will name.
    pub fn reserve_block(&mut self) -> MkfsResult<u32> {
        self.alloc_block()
    }

    /// Lists `block` on the free list once more.
    pub fn extra_free(&mut self, block: u32) {
        self.extra_free.push(block);
    }

    /// Overwrites the head of a block.
    pub fn write_raw(&mut self, block: u32, offset: usize, data: &[u8]) -> MkfsResult<()> {
        let start = block as usize * BLOCK_SIZE + offset;
        let end = start + data.len();
        ensure!(end <= self.img.len(), MkfsError::IO(BlockIOError::OutOfBounds));
        self.img[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Number of cached free inode numbers ahead of the free-list head.
    pub fn set_free_list_skip(&mut self, skip: u32) -> MkfsResult<()> {
        ensure!(
            SB_FREE_LIST_BASE as u64 + 4 * skip as u64 + 8 <= BLOCK_SIZE_U64,
            MkfsError::Invalid("Free-list head does not fit the superblock")
        );
        self.free_list_skip = skip;
        Ok(())
    }

    /// Superblock values that differ from what the builder computes.
    pub fn override_counts(
        &mut self,
        fs_size: Option<u32>,
        free_blocks: Option<u32>,
        free_inodes: Option<u32>,
    ) {
        self.fs_size = fs_size;
        self.free_blocks = free_blocks;
        self.free_inodes = free_inodes;
    }

    /// Blocks the free list will hold, in list order.
    pub fn free_list(&self) -> Vec<u32> {
        let mut free: Vec<u32> = (self.first_data_block()..self.block_count)
            .filter(|&b| !self.used[b as usize])
            .collect();
        free.extend_from_slice(&self.extra_free);
        free
    }

    /// Serializes the partition image.
    pub fn build(&self) -> MkfsResult<Vec<u8>> {
        let mut img = self.img.clone();
        let mut io = MemBlockIO::new(&mut img);

        for (ino, inode) in self.inodes.iter().enumerate() {
            let off = INODE_TABLE_START as u64 * BLOCK_SIZE_U64 + (ino * INODE_SIZE) as u64;
            io.write_struct(off, inode)?;
        }

        let free = self.free_list();
        let free_inodes: Vec<u32> = (1..self.inodes.len() as u32)
            .filter(|&i| self.inodes[i as usize].mode.get() & IFMT == IFFREE)
            .collect();

        let mut sb = RawSuperblock::new(self.fs_size.unwrap_or(self.block_count), self.inode_blocks);
        sb.free_blocks = self.free_blocks.unwrap_or(free.len() as u32).into();
        sb.free_inodes = self.free_inodes.unwrap_or(free_inodes.len() as u32).into();
        sb.free_list_skip = self.free_list_skip.into();
        let sb_off = SUPER_BLOCK as u64 * BLOCK_SIZE_U64;
        io.write_struct(sb_off, &sb)?;

        for i in 0..self.free_list_skip as usize {
            let cached = free_inodes.get(i).copied().unwrap_or(0);
            io.write_u32_be_at(sb_off + (SB_FREE_LIST_BASE + 4 * i) as u64, cached)?;
        }

        let head = sb_off + SB_FREE_LIST_BASE as u64 + 4 * self.free_list_skip as u64;
        write_free_list(&mut io, head, &free)?;

        drop(io);
        Ok(img)
    }

    /// Serializes a disk whose partition `index` holds the image.
    pub fn build_disk(&self, index: usize, start_sector: u32) -> MkfsResult<Vec<u8>> {
        ensure!(
            index < fscpart::PART_TABLE_ENTRIES,
            MkfsError::Invalid("Partition index out of range")
        );
        ensure!(
            start_sector >= 2,
            MkfsError::Invalid("Partition overlaps the partition table")
        );
        let part = self.build()?;
        let start = start_sector as usize * SECTOR_SIZE;

        let mut disk = vec![0u8; start + part.len()];
        disk[start..].copy_from_slice(&part);

        let mut table = PartTable::new_empty();
        table.entries[index] = PartEntry::new(
            PART_TYPE_FS,
            false,
            start_sector,
            self.block_count * SECTORS_PER_BLOCK,
            "eos32 fs",
        );
        let mut io = MemBlockIO::new(&mut disk);
        write_part_table(&mut io, &table).map_err(|e| match e {
            PartError::IO(e) => MkfsError::IO(e),
            _ => MkfsError::Invalid("Partition table write failed"),
        })?;
        drop(io);
        Ok(disk)
    }

    fn expect_dir(&self, ino: u32) -> MkfsResult<()> {
        let inode = self.inode(ino)?;
        ensure!(
            inode.kind() == Some(InodeKind::Directory),
            MkfsError::NotADirectory(ino)
        );
        Ok(())
    }

    fn bump_links(&mut self, ino: u32) {
        if let Some(i) = self.inodes.get_mut(ino as usize) {
            i.nlink = (i.nlink.get() + 1).into();
        }
    }

    fn alloc_inode(&mut self) -> MkfsResult<u32> {
        let ino = (ROOT_INODE + 1..self.inodes.len() as u32)
            .find(|&i| self.inodes[i as usize].mode.get() == IFFREE)
            .ok_or(MkfsError::OutOfInodes)?;
        // placeholder so the slot is not handed out twice before it is filled
        self.inodes[ino as usize] = RawInode::new(IFREG, 0);
        Ok(ino)
    }

    fn alloc_block(&mut self) -> MkfsResult<u32> {
        while self.next_block < self.block_count && self.used[self.next_block as usize] {
            self.next_block += 1;
        }
        ensure!(self.next_block < self.block_count, MkfsError::OutOfBlocks);
        let b = self.next_block;
        self.used[b as usize] = true;
        self.next_block += 1;
        Ok(b)
    }

    /// Allocates `count` data blocks plus the pointer blocks they need.
    /// Returns the 8 reference slots.
    fn alloc_content(&mut self, count: usize) -> MkfsResult<[u32; INODE_REFS]> {
        ensure!(
            count <= DIRECT_REFS + REFS_PER_BLOCK + REFS_PER_BLOCK * REFS_PER_BLOCK,
            MkfsError::Invalid("File too large")
        );
        let mut refs = [0u32; INODE_REFS];
        let mut left = count;

        for r in refs.iter_mut().take(DIRECT_REFS.min(left)) {
            *r = self.alloc_block()?;
        }
        left -= DIRECT_REFS.min(left);

        if left > 0 {
            let n = left.min(REFS_PER_BLOCK);
            refs[SINGLE_INDIRECT_SLOT] = self.alloc_pointer_block(n)?;
            left -= n;
        }

        if left > 0 {
            let double = self.alloc_block()?;
            let mut index = 0;
            while left > 0 {
                let n = left.min(REFS_PER_BLOCK);
                let second = self.alloc_pointer_block(n)?;
                self.put_word(double, index, second);
                index += 1;
                left -= n;
            }
            refs[DOUBLE_INDIRECT_SLOT] = double;
        }
        Ok(refs)
    }

    fn alloc_pointer_block(&mut self, entries: usize) -> MkfsResult<u32> {
        let ptr = self.alloc_block()?;
        for i in 0..entries {
            let b = self.alloc_block()?;
            self.put_word(ptr, i, b);
        }
        Ok(ptr)
    }

    fn put_word(&mut self, block: u32, index: usize, value: u32) {
        let off = block as usize * BLOCK_SIZE + index * 4;
        self.img[off..off + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn put_entry(&mut self, block: u32, index: usize, ino: u32, name: &[u8]) {
        let off = block as usize * BLOCK_SIZE + index * DIRENT_SIZE;
        let entry = DirEntry::new(ino, name);
        self.img[off..off + DIRENT_SIZE].copy_from_slice(entry.as_bytes());
    }

    fn free_entry_slot(&self, block: u32) -> Option<usize> {
        let base = block as usize * BLOCK_SIZE;
        (0..DIRENTS_PER_BLOCK).find(|i| {
            let off = base + i * DIRENT_SIZE;
            self.img[off..off + 4] == [0; 4]
        })
    }
}

/// Writes `free` as a chain of nodes starting at byte `head`.
///
/// Entry 0 of each node names the next node's block, itself taken from
/// the list.
fn write_free_list<IO: BlockIO + ?Sized>(io: &mut IO, head: u64, free: &[u32]) -> MkfsResult<()> {
    let mut node = head;
    let mut rest = free;

    loop {
        let room = BLOCK_SIZE_U64 - node % BLOCK_SIZE_U64 - 4;
        let capacity = ((room / 4) as usize).min(FREE_LIST_NODE_ENTRIES);
        ensure!(capacity >= 2, MkfsError::Invalid("Free-list node does not fit"));

        let (next, tail) = match rest.split_first() {
            Some((&first, tail)) if rest.len() > capacity - 1 => (first, tail),
            _ => (0, rest),
        };
        let take = tail.len().min(capacity - 1);

        io.write_u32_be_at(node, 1 + take as u32)?;
        io.write_u32_be_at(node + 4, next)?;
        for (i, b) in tail[..take].iter().enumerate() {
            io.write_u32_be_at(node + 8 + 4 * i as u64, *b)?;
        }
        rest = &tail[take..];

        if next == 0 {
            return Ok(());
        }
        node = next as u64 * BLOCK_SIZE_U64;
    }
}

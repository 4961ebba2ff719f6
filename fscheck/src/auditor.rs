// SPDX-License-Identifier: MIT

//! Directory walk from the root counting the entries that name each inode.

use alloc::vec;

use fscio::prelude::*;
use zerocopy::FromBytes;

use crate::{
    constant::*,
    context::CheckContext,
    errors::*,
    meta::Eos32Meta,
    resolver::data_blocks,
    types::{DirEntry, InodeKind, RawInode},
};

/// Recursive directory auditor.
///
/// Every entry naming a directory walks that directory again, so a hard
/// linked directory counts its children once per link. Cycles end at the
/// depth limit.
pub struct DirectoryAuditor<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a Eos32Meta,
    ctx: &'a mut CheckContext,
    max_depth: u32,
}

impl<'a, IO: BlockIO + ?Sized> DirectoryAuditor<'a, IO> {
    pub fn new(
        io: &'a mut IO,
        meta: &'a Eos32Meta,
        ctx: &'a mut CheckContext,
        max_depth: u32,
    ) -> Self {
        Self {
            io,
            meta,
            ctx,
            max_depth,
        }
    }

    /// Audits the tree below the root inode.
    ///
    /// Afterwards the root counts one link less, cancelling its own "." entry
    /// being seen in addition to the walk's entry point.
    pub fn audit_root(&mut self) -> FsckResult<()> {
        ensure!(
            ROOT_INODE < self.meta.inode_count(),
            FsckError::InodeOutOfRange(ROOT_INODE)
        );
        let root = self.read_inode(ROOT_INODE)?;
        let mode = root.mode.get();
        ensure!(
            InodeKind::from_mode(mode) == Some(InodeKind::Directory),
            FsckError::RootNotDirectory { mode }
        );

        self.audit_inode(ROOT_INODE, 0)?;

        let root = &mut self.ctx.inodes[ROOT_INODE as usize];
        root.observed_links = root.observed_links.saturating_sub(1);
        Ok(())
    }

    fn read_inode(&mut self, ino: u32) -> FsckResult<RawInode> {
        let (block, offset) = self.meta.inode_location(ino);
        let raw: RawInode = self
            .io
            .read_struct(block as u64 * BLOCK_SIZE_U64 + offset as u64)?;
        Ok(raw)
    }

    fn observe(&mut self, ino: u32) -> FsckResult<()> {
        let d = self
            .ctx
            .inodes
            .get_mut(ino as usize)
            .ok_or(FsckError::InodeOutOfRange(ino))?;
        d.observed_links = d.observed_links.saturating_add(1);
        Ok(())
    }

    fn audit_inode(&mut self, ino: u32, depth: u32) -> FsckResult<()> {
        self.observe(ino)?;
        ensure!(
            depth <= self.max_depth,
            FsckError::MaxDepthExceeded { inode: ino, depth }
        );

        let raw = self.read_inode(ino)?;
        let mode = raw.mode.get();
        match InodeKind::from_mode(mode) {
            None => return Err(FsckError::IllegalInodeType { inode: ino, mode }),
            Some(InodeKind::Free) => return Err(FsckError::InodeInDirectoryButFree(ino)),
            Some(InodeKind::Directory) => {
                let stats = &mut self.ctx.stats;
                stats.dirs_visited += 1;
                stats.max_depth = stats.max_depth.max(depth as usize);

                for block in data_blocks(&mut *self.io, self.meta.block_count, &raw.refs())? {
                    self.audit_directory_block(block, depth)?;
                }
            }
            Some(InodeKind::Regular) => self.ctx.stats.files_found += 1,
            Some(InodeKind::CharSpecial | InodeKind::BlockSpecial) => {}
        }
        Ok(())
    }

    fn audit_directory_block(&mut self, block: u32, depth: u32) -> FsckResult<()> {
        let mut buf = vec![0u8; BLOCK_SIZE];
        self.io.read_block(block, BLOCK_SIZE, &mut buf)?;

        for (index, chunk) in buf.chunks_exact(DIRENT_SIZE).enumerate() {
            let entry = DirEntry::ref_from_bytes(chunk)
                .map_err(|_| FsckError::Invalid("Directory entry size"))?;
            let ino = entry.inode.get();
            if ino == 0 {
                continue;
            }
            self.ctx.stats.entries_scanned += 1;

            let self_or_parent =
                (index == 0 && entry.is_dot()) || (index == 1 && entry.is_dotdot());
            if self_or_parent {
                self.observe(ino)?;
            } else {
                self.audit_inode(ino, depth + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "mkfs"))]
mod tests {
    use super::*;
    use crate::{mkfs::ImageBuilder, scanner::scan_inodes};

    fn audit(b: &ImageBuilder, max_depth: u32) -> (FsckResult<()>, CheckContext) {
        let mut img = b.build().unwrap();
        let mut io = MemBlockIO::new(&mut img);
        let meta = Eos32Meta::from_io(&mut io, b.block_count()).unwrap();
        let mut ctx = CheckContext::new(&meta);
        scan_inodes(&mut io, &meta, &mut ctx).unwrap();
        let res = DirectoryAuditor::new(&mut io, &meta, &mut ctx, max_depth).audit_root();
        (res, ctx)
    }

    #[test]
    fn dot_entries_count_without_descending() {
        let mut b = ImageBuilder::new(32, 1).unwrap();
        let a = b.mkdir(ROOT_INODE, "a").unwrap();
        let f = b.add_file(a, "f", 1).unwrap();

        let (res, ctx) = audit(&b, DEFAULT_MAX_DEPTH);
        res.unwrap();
        assert_eq!(ctx.inode(ROOT_INODE).unwrap().observed_links, 3);
        assert_eq!(ctx.inode(a).unwrap().observed_links, 2);
        assert_eq!(ctx.inode(f).unwrap().observed_links, 1);
        assert_eq!(ctx.stats.entries_scanned, 6);
        assert_eq!(ctx.stats.max_depth, 1);
    }

    #[test]
    fn dot_name_outside_first_slots_is_a_child() {
        let mut b = ImageBuilder::new(32, 1).unwrap();
        let f = b.add_file(ROOT_INODE, ".", 1).unwrap();
        let (res, ctx) = audit(&b, DEFAULT_MAX_DEPTH);
        res.unwrap();
        assert_eq!(ctx.inode(f).unwrap().observed_links, 1);
    }

    #[test]
    fn depth_zero_allows_only_the_root() {
        let mut b = ImageBuilder::new(32, 1).unwrap();
        let a = b.mkdir(ROOT_INODE, "a").unwrap();
        let (res, _) = audit(&b, 0);
        assert_eq!(res, Err(FsckError::MaxDepthExceeded { inode: a, depth: 1 }));
    }

    #[test]
    fn directory_cycle_ends_at_depth_limit() {
        let mut b = ImageBuilder::new(32, 1).unwrap();
        let a = b.mkdir(ROOT_INODE, "a").unwrap();
        b.add_entry(a, "up", ROOT_INODE).unwrap();
        let (res, ctx) = audit(&b, 5);
        assert_eq!(res, Err(FsckError::MaxDepthExceeded { inode: ROOT_INODE, depth: 6 }));
        assert_eq!(ctx.stats.max_depth, 5);
    }
}

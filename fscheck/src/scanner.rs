// SPDX-License-Identifier: MIT

//! Inode table scan: classifies every slot, caches its stored link count and
//! size, and accounts every block it references.

use alloc::vec;

use fscio::prelude::*;
use zerocopy::FromBytes;

use crate::{
    constant::*,
    context::{CheckContext, InodeDerived},
    errors::*,
    meta::Eos32Meta,
    resolver::{RefKind, walk_refs},
    types::{InodeKind, RawInode},
};

/// Scans all `inode_blocks` blocks of the inode table.
pub fn scan_inodes<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &Eos32Meta,
    ctx: &mut CheckContext,
) -> FsckResult<()> {
    let mut buf = vec![0u8; BLOCK_SIZE];

    for i in 0..meta.inode_blocks {
        io.read_block(INODE_TABLE_START + i, BLOCK_SIZE, &mut buf)?;

        for (slot, chunk) in buf.chunks_exact(INODE_SIZE).enumerate() {
            let ino = i * INODES_PER_BLOCK + slot as u32;
            let raw = RawInode::read_from_bytes(chunk)
                .map_err(|_| FsckError::Invalid("Inode record size"))?;
            let derived = scan_inode(io, meta, ctx, ino, &raw)?;
            ctx.inodes[ino as usize] = derived;
            ctx.stats.inodes_checked += 1;
        }
    }
    Ok(())
}

fn scan_inode<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &Eos32Meta,
    ctx: &mut CheckContext,
    ino: u32,
    raw: &RawInode,
) -> FsckResult<InodeDerived> {
    let mode = raw.mode.get();
    let kind = InodeKind::from_mode(mode).ok_or(FsckError::IllegalInodeType { inode: ino, mode })?;

    let mut derived = InodeDerived {
        kind,
        stored_links: raw.nlink.get(),
        stored_size: raw.size.get(),
        ..InodeDerived::default()
    };
    if kind.is_special() {
        return Ok(derived);
    }

    let blocks = &mut ctx.blocks;
    let tally = walk_refs(io, meta.block_count, &raw.refs(), |b, _kind: RefKind| {
        blocks.account_file(b).map(drop)
    })?;
    derived.computed_size = tally.data_bytes();
    ctx.stats.indirect_blocks += tally.indirect as usize;
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;
    use zerocopy::byteorder::big_endian::U32;

    const BLOCKS: u32 = 32;

    fn meta() -> Eos32Meta {
        Eos32Meta {
            block_count: BLOCKS,
            fs_size: BLOCKS,
            inode_blocks: 1,
            free_blocks: 0,
            free_inodes: 0,
            free_list_skip: 0,
        }
    }

    fn put_inode(img: &mut [u8], ino: u32, inode: &RawInode) {
        let off = INODE_TABLE_START as usize * BLOCK_SIZE + ino as usize * INODE_SIZE;
        img[off..off + INODE_SIZE].copy_from_slice(inode.as_bytes());
    }

    #[test]
    fn caches_stored_values_and_accounts_blocks() {
        let mut img = vec![0u8; BLOCKS as usize * BLOCK_SIZE];
        let mut file = RawInode::new(IFREG | 0o644, 1);
        file.size = U32::new(5000);
        file.refs[0] = U32::new(3);
        file.refs[1] = U32::new(4);
        file.refs[6] = U32::new(5);
        let ptr = 5 * BLOCK_SIZE;
        img[ptr..ptr + 4].copy_from_slice(&6u32.to_be_bytes());
        put_inode(&mut img, 2, &file);

        let mut dev = RawInode::new(IFCHR | 0o600, 1);
        dev.refs[0] = U32::new(0xFFFF_FFFF);
        put_inode(&mut img, 3, &dev);

        let meta = meta();
        let mut ctx = CheckContext::new(&meta);
        let mut io = MemBlockIO::new(&mut img);
        scan_inodes(&mut io, &meta, &mut ctx).unwrap();

        let d = ctx.inode(2).unwrap();
        assert_eq!(d.kind, InodeKind::Regular);
        assert_eq!(d.stored_links, 1);
        assert_eq!(d.stored_size, 5000);
        assert_eq!(d.computed_size, 3 * 4096);
        for b in 3..=6 {
            assert_eq!(ctx.blocks.get(b).file_refs, 1, "block {b}");
        }
        assert_eq!(ctx.inode(3).unwrap().kind, InodeKind::CharSpecial);
        assert_eq!(ctx.stats.inodes_checked, 64);
        assert_eq!(ctx.stats.indirect_blocks, 1);
        assert_eq!(ctx.free_inode_slots(), 61);
    }

    #[test]
    fn illegal_type_anywhere_in_table() {
        let mut img = vec![0u8; BLOCKS as usize * BLOCK_SIZE];
        put_inode(&mut img, 40, &RawInode::new(0o60000, 0));

        let meta = meta();
        let mut ctx = CheckContext::new(&meta);
        let mut io = MemBlockIO::new(&mut img);
        assert_eq!(
            scan_inodes(&mut io, &meta, &mut ctx),
            Err(FsckError::IllegalInodeType {
                inode: 40,
                mode: 0o60000
            })
        );
    }

    #[test]
    fn out_of_range_direct_ref() {
        let mut img = vec![0u8; BLOCKS as usize * BLOCK_SIZE];
        let mut file = RawInode::new(IFREG, 1);
        file.refs[2] = U32::new(BLOCKS);
        put_inode(&mut img, 5, &file);

        let meta = meta();
        let mut ctx = CheckContext::new(&meta);
        let mut io = MemBlockIO::new(&mut img);
        assert_eq!(
            scan_inodes(&mut io, &meta, &mut ctx),
            Err(FsckError::OutOfRangeBlock(BLOCKS))
        );
    }
}

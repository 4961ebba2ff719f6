// SPDX-License-Identifier: MIT

//! Cross-checks of the derived tables. Each check reports the first
//! violation in ascending block or inode order.

use crate::{constant::*, context::CheckContext, errors::*, meta::Eos32Meta, types::InodeKind};

/// Every data-region block must be in exactly one file or on the free list once.
pub fn check_block_region(meta: &Eos32Meta, ctx: &CheckContext) -> FsckResult<()> {
    for (block, u) in ctx.blocks.region(meta.first_data_block()) {
        if u.file_refs == 0 && u.free_refs == 0 {
            bail!(FsckError::OrphanBlock(block));
        }
        if u.file_refs >= 1 && u.free_refs >= 1 {
            bail!(FsckError::DoubleAllocatedBlock(block));
        }
        if u.free_refs > 1 {
            bail!(FsckError::BlockMultiplyFreeListed(block));
        }
        if u.file_refs > 1 {
            bail!(FsckError::BlockMultiplyReferenced(block));
        }
    }
    Ok(())
}

/// Stored link counts against the entries found by the directory walk.
pub fn check_links(ctx: &CheckContext) -> FsckResult<()> {
    for (ino, d) in ctx.inodes.iter().enumerate() {
        let inode = ino as u32;
        let (stored, observed) = (d.stored_links, d.observed_links);
        if observed != stored {
            if stored == 0 {
                bail!(FsckError::InodeUnreachableButLinked { inode, observed });
            }
            if observed == 0 {
                bail!(FsckError::DirectoryUnreachableFromRoot { inode, stored });
            }
            bail!(FsckError::LinkCountMismatch {
                inode,
                stored,
                observed
            });
        }
        ensure!(
            observed != 0 || (d.computed_size == 0 && d.kind == InodeKind::Free),
            FsckError::InodeNotFreeButUnlinked(inode)
        );
    }
    Ok(())
}

/// The stored size must end inside the last allocated block:
/// `computed - 4096 < stored <= computed`. Holes are not counted.
pub fn check_sizes(ctx: &CheckContext) -> FsckResult<()> {
    for (ino, d) in ctx.inodes.iter().enumerate() {
        if !d.kind.has_content() {
            continue;
        }
        let stored = d.stored_size as u64;
        let computed = d.computed_size;
        let fits = stored == computed
            || (stored < computed && stored > computed.saturating_sub(BLOCK_SIZE_U64));
        ensure!(
            fits,
            FsckError::SizeMismatch {
                inode: ino as u32,
                stored: d.stored_size,
                computed,
            }
        );
    }
    Ok(())
}

// SPDX-License-Identifier: MIT

use fscheck::prelude::*;
use fscio::prelude::*;

fn check(b: &ImageBuilder) -> FsckResult<VerifyReport> {
    check_with(b, &CheckOptions::default())
}

fn check_with(b: &ImageBuilder, opt: &CheckOptions) -> FsckResult<VerifyReport> {
    let mut img = b.build().unwrap();
    let mut io = MemBlockIO::new(&mut img);
    check_volume(&mut io, b.block_count(), opt)
}

/// Runs every phase and hands back the derived tables.
fn derive(b: &ImageBuilder) -> (VerifyReport, CheckContext) {
    let mut img = b.build().unwrap();
    let mut io = MemBlockIO::new(&mut img);
    let mut checker = Eos32Checker::new(&mut io, b.block_count()).unwrap();
    let rep = checker.check_all().unwrap();
    (rep, checker.context().clone())
}

fn sample_tree() -> ImageBuilder {
    let mut b = ImageBuilder::new(256, 2).unwrap();
    let usr = b.mkdir(ROOT_INODE, "usr").unwrap();
    let bin = b.mkdir(usr, "bin").unwrap();
    b.mkdir(ROOT_INODE, "tmp").unwrap();
    b.add_file(bin, "sh", 20_000).unwrap();
    b.add_file(usr, "empty", 0).unwrap();
    b.mknod(ROOT_INODE, "console", InodeKind::CharSpecial).unwrap();
    b.mknod(ROOT_INODE, "disk", InodeKind::BlockSpecial).unwrap();
    b
}

#[test]
fn root_only_file_system() {
    let b = ImageBuilder::new(64, 1).unwrap();
    let rep = check(&b).unwrap();
    assert!(rep.ok());
    assert_eq!(rep.count(Severity::Warn), 0);

    let (_, ctx) = derive(&b);
    let root = ctx.inode(ROOT_INODE).unwrap();
    assert_eq!(root.observed_links, 2);
    assert_eq!(root.stored_links, 2);
}

#[test]
fn three_block_file() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "three", 3 * 4096 - 100).unwrap();
    check(&b).unwrap();

    let (_, ctx) = derive(&b);
    assert_eq!(ctx.inode(f).unwrap().computed_size, 3 * 4096);
}

#[test]
fn well_formed_tree_is_consistent() {
    let b = sample_tree();
    let (rep, ctx) = derive(&b);
    assert!(rep.ok(), "{rep}");

    for (block, u) in ctx.blocks.region(b.first_data_block()) {
        assert!(u.is_consistent(), "block {block}: {u:?}");
    }
    for (ino, d) in ctx.inodes.iter().enumerate() {
        assert_eq!(d.observed_links, d.stored_links, "inode {ino}");
    }
    // root: ".", "..", its own entry point and one ".." per subdirectory
    assert_eq!(ctx.inode(ROOT_INODE).unwrap().observed_links, 4);
    assert_eq!(ctx.stats.dirs_visited, 4);
    assert_eq!(ctx.stats.files_found, 2);
}

#[test]
fn block_in_file_and_free_list() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 4096).unwrap();
    let block = b.inode(f).unwrap().refs()[0];
    b.extra_free(block);
    assert_eq!(check(&b), Err(FsckError::DoubleAllocatedBlock(block)));
}

#[test]
fn orphan_block() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let lost = b.reserve_block().unwrap();
    assert_eq!(check(&b), Err(FsckError::OrphanBlock(lost)));
}

#[test]
fn block_listed_twice_as_free() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.extra_free(40);
    assert_eq!(check(&b), Err(FsckError::BlockMultiplyFreeListed(40)));
}

#[test]
fn block_shared_by_two_files() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 4096).unwrap();
    let g = b.add_file(ROOT_INODE, "g", 4096).unwrap();
    let shared = b.inode(f).unwrap().refs()[0];
    b.set_ref(g, 0, shared).unwrap();
    assert_eq!(check(&b), Err(FsckError::BlockMultiplyReferenced(shared)));
}

#[test]
fn file_through_single_and_double_indirection() {
    let mut b = ImageBuilder::new(2100, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "big", 2000 * 4096).unwrap();
    let (rep, ctx) = derive(&b);
    assert!(rep.ok(), "{rep}");
    assert_eq!(ctx.inode(f).unwrap().computed_size, 2000 * 4096);
    // single, double and one second-level block
    assert_eq!(ctx.stats.indirect_blocks, 3);
}

#[test]
fn hard_link_counts_twice() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "a", 10).unwrap();
    b.link(ROOT_INODE, "b", f).unwrap();
    let (rep, ctx) = derive(&b);
    assert!(rep.ok());
    let d = ctx.inode(f).unwrap();
    assert_eq!((d.stored_links, d.observed_links), (2, 2));
}

#[test]
fn hard_linked_directory_is_walked_per_link() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let d = b.mkdir(ROOT_INODE, "d").unwrap();
    let x = b.add_file(d, "x", 10).unwrap();
    b.link(ROOT_INODE, "alias", d).unwrap();

    let (rep, ctx) = derive(&b);
    assert!(!rep.ok());
    assert_eq!(ctx.stats.dirs_visited, 3);
    // entry, alias and "." once per walk
    assert_eq!(ctx.inode(d).unwrap().observed_links, 4);
    assert_eq!(ctx.inode(x).unwrap().observed_links, 2);
    assert_eq!(ctx.inode(ROOT_INODE).unwrap().observed_links, 4);
    assert_eq!(
        check(&b),
        Err(FsckError::LinkCountMismatch {
            inode: ROOT_INODE,
            stored: 3,
            observed: 4
        })
    );

    // with the directory counts matching the walk, the child is caught
    b.set_links(ROOT_INODE, 4).unwrap();
    b.set_links(d, 4).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::LinkCountMismatch {
            inode: x,
            stored: 1,
            observed: 2
        })
    );
}

#[test]
fn directory_cycle_hits_depth_limit() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let d = b.mkdir(ROOT_INODE, "d").unwrap();
    b.add_entry(d, "loop", d).unwrap();
    let opt = CheckOptions {
        max_depth: 4,
        ..CheckOptions::default()
    };
    assert_eq!(
        check_with(&b, &opt),
        Err(FsckError::MaxDepthExceeded { inode: d, depth: 5 })
    );
    assert_eq!(
        check(&b),
        Err(FsckError::MaxDepthExceeded {
            inode: d,
            depth: DEFAULT_MAX_DEPTH + 1
        })
    );
}

#[test]
fn free_list_over_several_link_blocks() {
    let b = ImageBuilder::new(1500, 1).unwrap();
    let (rep, ctx) = derive(&b);
    assert!(rep.ok());
    let walk = rep.findings.iter().find(|f| f.code == "FREE.WALK").unwrap();
    assert!(walk.msg.ends_with("2 link blocks"), "{}", walk.msg);
    assert_eq!(ctx.blocks.free_total(), 1496);
}

#[test]
fn free_list_head_after_cached_inodes() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.set_free_list_skip(7).unwrap();
    assert!(check(&b).unwrap().ok());
}

#[test]
fn free_list_link_read_with_zero_count() {
    let b = ImageBuilder::new(64, 1).unwrap();
    let mut img = b.build().unwrap();
    let put = |img: &mut Vec<u8>, off: usize, v: u32| {
        img[off..off + 4].copy_from_slice(&v.to_be_bytes())
    };

    // superblock node: count 0, link to block 4
    let head = 4096 + 24;
    put(&mut img, head, 0);
    put(&mut img, head + 4, 4);
    // block 4 holds the remaining free blocks 5..64
    let node = 4 * 4096;
    put(&mut img, node, 60);
    put(&mut img, node + 4, 0);
    for (i, block) in (5..64u32).enumerate() {
        put(&mut img, node + 8 + 4 * i, block);
    }

    let mut io = MemBlockIO::new(&mut img);
    let rep = check_volume(&mut io, 64, &CheckOptions::default()).unwrap();
    assert!(rep.ok(), "{rep}");
    assert_eq!(rep.count(Severity::Warn), 0);
}

#[test]
fn free_list_loop_is_detected() {
    let b = ImageBuilder::new(1200, 1).unwrap();
    let mut img = b.build().unwrap();
    // entry 0 of the first link block (block 4) points back at itself
    let off = 4 * 4096 + 4;
    img[off..off + 4].copy_from_slice(&4u32.to_be_bytes());

    let mut io = MemBlockIO::new(&mut img);
    assert_eq!(
        check_volume(&mut io, 1200, &CheckOptions::default()),
        Err(FsckError::BlockMultiplyFreeListed(4))
    );
}

#[test]
fn link_count_mismatch() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 1).unwrap();
    b.set_links(f, 3).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::LinkCountMismatch {
            inode: f,
            stored: 3,
            observed: 1
        })
    );
}

#[test]
fn linked_inode_with_zero_count() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 1).unwrap();
    b.set_links(f, 0).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::InodeUnreachableButLinked {
            inode: f,
            observed: 1
        })
    );
}

#[test]
fn allocated_inode_outside_the_tree() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.set_mode(20, IFREG | 0o644).unwrap();
    assert_eq!(check(&b), Err(FsckError::InodeNotFreeButUnlinked(20)));

    b.set_links(20, 1).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::DirectoryUnreachableFromRoot {
            inode: 20,
            stored: 1
        })
    );
}

#[test]
fn free_inode_named_by_directory() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.add_entry(ROOT_INODE, "ghost", 10).unwrap();
    assert_eq!(check(&b), Err(FsckError::InodeInDirectoryButFree(10)));
}

#[test]
fn illegal_inode_type() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 1).unwrap();
    b.set_mode(f, 0o60644).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::IllegalInodeType {
            inode: f,
            mode: 0o60644
        })
    );
}

#[test]
fn root_must_be_a_directory() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.set_mode(ROOT_INODE, IFREG | 0o644).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::RootNotDirectory {
            mode: IFREG | 0o644
        })
    );
}

#[test]
fn depth_limit() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let mut dir = ROOT_INODE;
    let mut chain = Vec::new();
    for name in ["a", "b", "c", "d", "e"] {
        dir = b.mkdir(dir, name).unwrap();
        chain.push(dir);
    }
    let opt = CheckOptions {
        max_depth: 3,
        ..CheckOptions::default()
    };
    assert_eq!(
        check_with(&b, &opt),
        Err(FsckError::MaxDepthExceeded {
            inode: chain[3],
            depth: 4
        })
    );
    assert!(check(&b).is_ok());
}

#[test]
fn reference_past_the_partition() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 1).unwrap();
    b.set_ref(f, 2, 64).unwrap();
    assert_eq!(check(&b), Err(FsckError::OutOfRangeBlock(64)));
}

#[test]
fn entry_past_the_inode_table() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.add_entry(ROOT_INODE, "far", 500).unwrap();
    assert_eq!(check(&b), Err(FsckError::InodeOutOfRange(500)));
}

#[test]
fn size_outside_last_block() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 3 * 4096).unwrap();
    b.set_size(f, 100).unwrap();
    assert_eq!(
        check(&b),
        Err(FsckError::SizeMismatch {
            inode: f,
            stored: 100,
            computed: 3 * 4096
        })
    );
}

#[test]
fn superblock_counts_only_warn() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.override_counts(Some(70), Some(3), Some(1));
    let rep = check(&b).unwrap();
    assert!(rep.ok());
    assert!(rep.find("SB.FSSIZE").is_some());
    assert!(rep.find("SB.FREEBLK").is_some());
    assert!(rep.find("SB.FREEINO").is_some());

    let opt = CheckOptions {
        warn_free_counts: false,
        ..CheckOptions::default()
    };
    let rep = check_with(&b, &opt).unwrap();
    assert!(rep.find("SB.FREEBLK").is_none());
}

#[test]
fn phase_selection_skips_other_checks() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    let f = b.add_file(ROOT_INODE, "f", 4096).unwrap();
    b.reserve_block().unwrap();
    b.set_links(f, 5).unwrap();

    let only = |phases| CheckOptions {
        phases,
        ..CheckOptions::default()
    };
    assert!(check_with(&b, &only(VerifyPhases::SIZES)).is_ok());
    assert!(matches!(
        check_with(&b, &only(VerifyPhases::LINKS)),
        Err(FsckError::LinkCountMismatch { .. })
    ));
    assert!(matches!(
        check_with(&b, &only(VerifyPhases::BLOCKS)),
        Err(FsckError::OrphanBlock(_))
    ));
}

#[test]
fn report_keeps_findings_before_the_failure() {
    let mut b = ImageBuilder::new(64, 1).unwrap();
    b.override_counts(None, Some(1), None);
    b.reserve_block().unwrap();

    let mut img = b.build().unwrap();
    let mut io = MemBlockIO::new(&mut img);
    let mut checker = Eos32Checker::new(&mut io, 64).unwrap();
    let rep = checker.check_all().unwrap();

    assert!(matches!(rep.fatal, Some(FsckError::OrphanBlock(_))));
    assert!(rep.find("SB.FREEBLK").is_some());
    assert!(rep.find("BLK.ORPHAN").is_some());
    assert!(rep.find("LNK.CHECK").is_none());
}

#[test]
fn partition_too_small_for_inode_table() {
    let b = ImageBuilder::new(64, 1).unwrap();
    let mut img = b.build().unwrap();
    let mut io = MemBlockIO::new(&mut img);
    assert_eq!(
        check_volume(&mut io, 2, &CheckOptions::default()).map(|_| ()),
        Err(FsckError::FsTooSmall {
            blocks: 2,
            needed: 3
        })
    );
}

// SPDX-License-Identifier: MIT

use alloc::format;

use fscio::prelude::*;

use crate::{
    auditor::DirectoryAuditor, constant::DEFAULT_MAX_DEPTH, context::CheckContext, errors::*,
    freelist::walk_free_list, meta::Eos32Meta, scanner::scan_inodes, verifier,
};

mod stats;
mod types;

pub use stats::WalkerStats;
pub use types::{
    Finding, ReportDisplay, ReportDisplayOpts, Severity, VerifierOptionsLike, VerifyPhases,
    VerifyReport,
};

/// Phased consistency check of one file system.
///
/// Phases run in a fixed order. The first inconsistency ends the run: it is
/// recorded as an error finding and in `VerifyReport::fatal`, and the
/// remaining phases are skipped. IO and internal failures are returned as `Err`.
pub trait FsChecker {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsckResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        self.run_phase(opt, &mut rep, VerifyPhases::GEOMETRY, Self::check_geometry)?;
        self.run_phase(opt, &mut rep, VerifyPhases::SCAN, Self::check_scan)?;
        self.run_phase(opt, &mut rep, VerifyPhases::FREELIST, Self::check_free_list)?;
        self.run_phase(opt, &mut rep, VerifyPhases::SUMMARY, Self::check_summary)?;
        self.run_phase(opt, &mut rep, VerifyPhases::TREE, Self::check_tree)?;
        self.run_phase(opt, &mut rep, VerifyPhases::BLOCK_CHECK, Self::check_blocks)?;
        self.run_phase(opt, &mut rep, VerifyPhases::LINK_CHECK, Self::check_links)?;
        self.run_phase(opt, &mut rep, VerifyPhases::SIZE_CHECK, Self::check_sizes)?;
        Ok(rep)
    }

    fn check_all(&mut self) -> FsckResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    /// Full check that only reports pass or the first inconsistency.
    fn fast_check(&mut self) -> FsckResult {
        self.check_all()?.result()
    }

    fn check_geometry(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_scan(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_free_list(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_summary(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_tree(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_blocks(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_links(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_sizes(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }

    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsckResult<()>
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsckResult<()>,
    {
        if !opt.phases().contains(phase) || rep.fatal.is_some() {
            return Ok(());
        }
        match f(self, opt, rep) {
            Ok(()) => Ok(()),
            Err(e) if e.is_inconsistency() => {
                rep.push(Finding::err(e.code(), format!("{e}")));
                rep.fatal = Some(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CheckOptions {
    pub phases: VerifyPhases,
    /// Directory nesting limit below the root.
    pub max_depth: u32,
    /// Compare the superblock free counts with what the run found.
    pub warn_free_counts: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            max_depth: DEFAULT_MAX_DEPTH,
            warn_free_counts: true,
        }
    }
}

impl VerifierOptionsLike for CheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases.closure()
    }
    fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

pub struct Eos32Checker<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: Eos32Meta,
    ctx: CheckContext,
}

impl<'a, IO: BlockIO + ?Sized> Eos32Checker<'a, IO> {
    /// Reads the superblock of a partition of `block_count` blocks.
    pub fn new(io: &'a mut IO, block_count: u32) -> FsckResult<Self> {
        let meta = Eos32Meta::from_io(io, block_count)?;
        let ctx = CheckContext::new(&meta);
        Ok(Self { io, meta, ctx })
    }

    pub fn meta(&self) -> &Eos32Meta {
        &self.meta
    }

    /// Tables derived so far.
    pub fn context(&self) -> &CheckContext {
        &self.ctx
    }
}

impl<'a, IO: BlockIO + ?Sized> FsChecker for Eos32Checker<'a, IO> {
    type Options = CheckOptions;

    fn check_geometry(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let m = &self.meta;
        rep.push(Finding::info(
            "SB.GEOM",
            format!(
                "{} blocks, {} inode blocks ({} inodes), data from block {}",
                m.block_count,
                m.inode_blocks,
                m.inode_count(),
                m.first_data_block()
            ),
        ));
        if m.fs_size != m.block_count {
            rep.push(Finding::warn(
                "SB.FSSIZE",
                format!(
                    "Superblock records {} blocks, partition holds {}",
                    m.fs_size, m.block_count
                ),
            ));
        }
        Ok(())
    }

    fn check_scan(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        scan_inodes(&mut *self.io, &self.meta, &mut self.ctx)?;
        rep.push(Finding::info(
            "INO.SCAN",
            format!(
                "Scanned {} inodes, {} pointer blocks",
                self.ctx.stats.inodes_checked, self.ctx.stats.indirect_blocks
            ),
        ));
        Ok(())
    }

    fn check_free_list(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let s = walk_free_list(&mut *self.io, &self.meta, &mut self.ctx)?;
        rep.push(Finding::info(
            "FREE.WALK",
            format!("Free list: {} blocks, {} link blocks", s.entries, s.links),
        ));
        if s.looped {
            rep.push(Finding::warn("FREE.LOOP", "Free list chain loops back"));
        }
        Ok(())
    }

    fn check_summary(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        if !opt.warn_free_counts {
            return Ok(());
        }
        let found_blocks = self.ctx.blocks.free_total();
        if self.meta.free_blocks as u64 != found_blocks {
            rep.push(Finding::warn(
                "SB.FREEBLK",
                format!(
                    "Superblock records {} free blocks, free list holds {}",
                    self.meta.free_blocks, found_blocks
                ),
            ));
        }
        let found_inodes = self.ctx.free_inode_slots();
        if self.meta.free_inodes != found_inodes {
            rep.push(Finding::warn(
                "SB.FREEINO",
                format!(
                    "Superblock records {} free inodes, inode table holds {}",
                    self.meta.free_inodes, found_inodes
                ),
            ));
        }
        Ok(())
    }

    fn check_tree(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let mut auditor =
            DirectoryAuditor::new(&mut *self.io, &self.meta, &mut self.ctx, opt.max_depth());
        auditor.audit_root()?;
        let s = self.ctx.stats;
        rep.push(Finding::info(
            "DIR.WALK",
            format!(
                "Walked {} dirs, {} files, {} entries, depth {}",
                s.dirs_visited, s.files_found, s.entries_scanned, s.max_depth
            ),
        ));
        Ok(())
    }

    fn check_blocks(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        verifier::check_block_region(&self.meta, &self.ctx)?;
        rep.push(Finding::info(
            "BLK.CHECK",
            format!("{} data blocks consistent", self.meta.data_block_count()),
        ));
        Ok(())
    }

    fn check_links(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        verifier::check_links(&self.ctx)?;
        rep.push(Finding::info("LNK.CHECK", "Link counts consistent"));
        Ok(())
    }

    fn check_sizes(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        verifier::check_sizes(&self.ctx)?;
        rep.push(Finding::info("INO.SIZES", "File sizes consistent"));
        Ok(())
    }
}

/// Checks the file system in the partition `io` is windowed on.
///
/// Returns the report of a consistent file system, or the first inconsistency.
pub fn check_volume<IO: BlockIO + ?Sized>(
    io: &mut IO,
    block_count: u32,
    opt: &CheckOptions,
) -> FsckResult<VerifyReport> {
    let mut checker = Eos32Checker::new(io, block_count)?;
    let rep = checker.check_with(opt)?;
    rep.result()?;
    Ok(rep)
}

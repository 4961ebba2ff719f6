// SPDX-License-Identifier: MIT

use alloc::{string::String, vec::Vec};
use core::cmp::Ordering;
use core::fmt;

use bitflags::bitflags;

use crate::{constant::DEFAULT_MAX_DEPTH, errors::*};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        use Severity::*;
        fn rank(s: Severity) -> u8 {
            match s {
                Info => 0,
                Warn => 1,
                Error => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}
impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }
    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Error,
            code,
            msg: msg.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
    /// Inconsistency that ended the run, if any.
    pub fatal: Option<FsckError>,
}

impl VerifyReport {
    pub fn has_error(&self) -> bool {
        self.fatal.is_some()
            || self
                .findings
                .iter()
                .any(|f| matches!(f.sev, Severity::Error))
    }

    pub fn first_error(&self) -> Option<&str> {
        self.findings
            .iter()
            .find(|f| matches!(f.sev, Severity::Error))
            .map(|f| f.msg.as_str())
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }
    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// Finding with the given code, if present.
    pub fn find(&self, code: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.code == code)
    }

    /// `Err` with the fatal inconsistency, `Ok` otherwise.
    pub fn result(&self) -> FsckResult<()> {
        match &self.fatal {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Display with options (filtering, prefix, summary...)
    pub fn display_with<'a>(&'a self, opts: ReportDisplayOpts) -> ReportDisplay<'a> {
        ReportDisplay::new(self, opts)
    }

    /// Display "warn + error"
    pub fn warn_and_errors<'a>(&'a self) -> ReportDisplay<'a> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            ..ReportDisplayOpts::default()
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl ReportDisplayOpts {
    fn new(min_level: Severity, prefix: &'static str, show_summary: bool, pad_code: usize) -> Self {
        Self {
            min_level,
            prefix,
            show_summary,
            pad_code,
        }
    }
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self::new(Severity::Info, "", false, 12)
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl<'a> ReportDisplay<'a> {
    pub fn new(rep: &'a VerifyReport, opts: ReportDisplayOpts) -> Self {
        Self { rep, opts }
    }
}

impl<'a> fmt::Display for ReportDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n_info = 0usize;
        let mut n_warn = 0usize;
        let mut n_err = 0usize;

        for it in &self.rep.findings {
            if it.sev < self.opts.min_level {
                continue;
            }
            let tag = match it.sev {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERR ",
            };
            match it.sev {
                Severity::Info => n_info += 1,
                Severity::Warn => n_warn += 1,
                Severity::Error => n_err += 1,
            }

            writeln!(
                f,
                "{}{tag}: {:<width$} {}",
                self.opts.prefix,
                it.code,
                it.msg,
                width = self.opts.pad_code
            )?;
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}Summary: errors={}  warns={}  infos={}",
                self.opts.prefix, n_err, n_warn, n_info
            )?;
        }

        Ok(())
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReportDisplay {
            rep: self,
            opts: ReportDisplayOpts::default(),
        }
        .fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        const GEOMETRY    = 1 << 0;
        const SCAN        = 1 << 1;
        const FREELIST    = 1 << 2;
        const SUMMARY     = 1 << 3;
        const TREE        = 1 << 4;
        const BLOCK_CHECK = 1 << 5;
        const LINK_CHECK  = 1 << 6;
        const SIZE_CHECK  = 1 << 7;

        /// Block accounting only (file and free-list counting).
        const BLOCKS = Self::SCAN.bits() | Self::FREELIST.bits() | Self::BLOCK_CHECK.bits();
        /// Link counts against the directory tree.
        const LINKS  = Self::SCAN.bits() | Self::TREE.bits() | Self::LINK_CHECK.bits();
        /// Stored sizes against allocated blocks.
        const SIZES  = Self::SCAN.bits() | Self::SIZE_CHECK.bits();
        const ALL    = u32::MAX;
    }
}

impl VerifyPhases {
    /// Adds the phases the selected ones depend on.
    pub fn closure(self) -> Self {
        let mut p = self | VerifyPhases::GEOMETRY;
        if p.intersects(VerifyPhases::BLOCK_CHECK | VerifyPhases::SUMMARY) {
            p |= VerifyPhases::SCAN | VerifyPhases::FREELIST;
        }
        if p.contains(VerifyPhases::LINK_CHECK) {
            p |= VerifyPhases::SCAN | VerifyPhases::TREE;
        }
        if p.contains(VerifyPhases::SIZE_CHECK) {
            p |= VerifyPhases::SCAN;
        }
        p
    }
}

/// Generic options that a checker can encapsulate/extend.
pub trait VerifierOptionsLike {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }
    fn max_depth(&self) -> u32 {
        DEFAULT_MAX_DEPTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn closure_pulls_dependencies() {
        let p = VerifyPhases::LINK_CHECK.closure();
        assert!(p.contains(VerifyPhases::GEOMETRY | VerifyPhases::SCAN | VerifyPhases::TREE));
        assert!(!p.contains(VerifyPhases::FREELIST));

        let p = VerifyPhases::SUMMARY.closure();
        assert!(p.contains(VerifyPhases::SCAN | VerifyPhases::FREELIST));

        assert_eq!(VerifyPhases::BLOCKS.closure(), VerifyPhases::BLOCKS | VerifyPhases::GEOMETRY);
    }

    #[test]
    fn report_display_filters_levels() {
        let mut rep = VerifyReport::default();
        rep.push(Finding::info("SCAN", "64 inodes"));
        rep.push(Finding::warn("SB.FREE", "free count differs"));
        rep.push(Finding::err("BLK.ORPHAN", "orphan"));

        let text = rep.warn_and_errors().to_string();
        assert!(!text.contains("INFO"));
        assert!(text.contains("WARN: SB.FREE"));
        assert!(text.contains("ERR : BLK.ORPHAN"));
        assert_eq!(rep.count(Severity::Warn), 1);
        assert_eq!(rep.first_error(), Some("orphan"));
        assert!(!rep.ok());

        let summary = rep
            .display_with(ReportDisplayOpts {
                show_summary: true,
                prefix: "> ",
                ..ReportDisplayOpts::default()
            })
            .to_string();
        assert!(summary.ends_with("> Summary: errors=1  warns=1  infos=1\n"));
    }
}

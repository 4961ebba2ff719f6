// SPDX-License-Identifier: MIT

use colored::{ColoredString, Colorize};
use fscheck::checker::{Finding, Severity, VerifyReport};
use fscio::prelude::IoStats;

use crate::utils::{LogLevel, log_level};

fn tag(sev: Severity) -> ColoredString {
    match sev {
        Severity::Info => "INFO".dimmed(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Error => "ERR ".red().bold(),
    }
}

/// Findings shown at the current log level.
///
/// Errors are left out: the run's failure is printed once, as `Error:`.
pub fn visible(rep: &VerifyReport) -> impl Iterator<Item = &Finding> {
    let min = match log_level() {
        LogLevel::Verbose => Severity::Info,
        LogLevel::Normal => Severity::Warn,
        LogLevel::Quiet => Severity::Error,
    };
    rep.findings
        .iter()
        .filter(move |f| f.sev >= min && f.sev != Severity::Error)
}

pub fn print_findings(rep: &VerifyReport) {
    for f in visible(rep) {
        crate::log_normal!("{} {:<12} {}", tag(f.sev), f.code, f.msg);
    }
}

pub fn print_summary(rep: &VerifyReport) {
    let warns = rep.count(Severity::Warn);
    if rep.ok() {
        let status = "File system is consistent".green().bold();
        match warns {
            0 => crate::log_info!("{status}"),
            n => crate::log_info!("{status} ({n} warnings)"),
        }
    } else {
        crate::log_info!(
            "{} after {} findings",
            "File system is inconsistent".red().bold(),
            rep.findings.len()
        );
    }
}

pub fn print_io_stats(stats: &IoStats) {
    crate::log_verbose!(
        "IO: {} reads, {} bytes ({} aligned, {} unaligned, largest {} bytes)",
        stats.reads,
        stats.read_bytes,
        stats.aligned_reads,
        stats.unaligned_reads,
        stats.max_read
    );
}

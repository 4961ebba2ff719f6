// SPDX-License-Identifier: MIT

mod config;
mod error;
mod utils;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use fscheck::checker::{Eos32Checker, FsChecker, VerifierOptionsLike};
use fscheck::constant::BLOCK_SIZE_U64;
use fscio::prelude::*;
use fscpart::{part_index, read_part_table};

use crate::config::{Config, Only};
use crate::error::{CliError, EXIT_USAGE, exit_code};
use crate::utils::{LogLevel, report, set_log_level};

#[derive(Parser)]
#[command(
    name = "fsc",
    version,
    about = "Block and link consistency checker for EOS32 file systems",
    long_about = None
)]
struct Cli {
    /// Disk image holding the partition table
    disk: PathBuf,

    /// Partition to check (0-15)
    #[arg(allow_negative_numbers = true, required_unless_present = "list")]
    partition: Option<i64>,

    /// Show every finding and IO statistics
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print the outcome
    #[arg(short, long)]
    quiet: bool,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory nesting limit below the root
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_depth: Option<u32>,

    /// Run only a subset of the checks (repeatable)
    #[arg(long, value_enum)]
    only: Vec<Only>,

    /// Print the partition table and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let level = if cli.verbose {
        LogLevel::Verbose
    } else if cli.quiet {
        LogLevel::Quiet
    } else {
        config.log.unwrap_or(LogLevel::Normal)
    };
    set_log_level(level);

    if let Some(index) = cli.partition.filter(|_| !cli.list) {
        part_index(index)?;
    }

    let mut file = File::open(&cli.disk).map_err(|source| CliError::OpenImage {
        path: cli.disk.clone(),
        source,
    })?;
    let mut io = StdBlockIO::new(&mut file);
    let disk_bytes = io.stream_len()?;
    let table = read_part_table(&mut io)?;

    let Some(index) = cli.partition.filter(|_| !cli.list) else {
        print!("{table}");
        return Ok(());
    };

    let window = table.select(index)?;
    log_info!("Checking {} in {}", window, cli.disk.display());
    for w in window.warnings(disk_bytes) {
        log_normal!("{} {w}", "WARN".yellow().bold());
    }

    let opt = config.check_options(cli.max_depth, &cli.only);
    log_verbose!("Phases: {:?}, max depth {}", opt.phases(), opt.max_depth);

    io.set_offset(window.byte_offset());
    let mut counter = IOCounter::with_align(&mut io, BLOCK_SIZE_U64);
    let rep = {
        let mut checker = Eos32Checker::new(&mut counter, window.block_count())?;
        checker.check_with(&opt)?
    };

    report::print_findings(&rep);
    report::print_io_stats(&counter.snapshot());
    report::print_summary(&rep);

    rep.result()?;
    Ok(())
}

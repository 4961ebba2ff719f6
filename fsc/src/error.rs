// SPDX-License-Identifier: MIT

use core::fmt;
use std::io;
use std::path::PathBuf;

use fscheck::errors::FsckError;
use fscio::errors::BlockIOError;
use fscpart::errors::PartError;

pub const EXIT_USAGE: u8 = 16;
pub const EXIT_OPEN: u8 = 17;
pub const EXIT_IO: u8 = 18;
pub const EXIT_PART_NUMBER: u8 = 19;
pub const EXIT_PART_TYPE: u8 = 20;
pub const EXIT_CONFIG: u8 = 22;
pub const EXIT_OTHER: u8 = 99;

/// Failures of the command itself, outside the libraries.
#[derive(Debug)]
pub enum CliError {
    OpenImage { path: PathBuf, source: io::Error },
    Config { path: PathBuf, msg: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::OpenImage { path, source } => {
                write!(f, "Cannot open disk image '{}': {source}", path.display())
            }
            CliError::Config { path, msg } => {
                write!(f, "Invalid configuration '{}': {msg}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::OpenImage { source, .. } => Some(source),
            CliError::Config { .. } => None,
        }
    }
}

/// Exit status for an error returned by a run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<FsckError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<PartError>() {
        return match e {
            PartError::IO(_) => EXIT_IO,
            PartError::IllegalNumber(_) => EXIT_PART_NUMBER,
            PartError::BadType { .. } | PartError::Swap { .. } => EXIT_PART_TYPE,
            PartError::Invalid(_) => EXIT_OTHER,
        };
    }
    if let Some(e) = err.downcast_ref::<CliError>() {
        return match e {
            CliError::OpenImage { .. } => EXIT_OPEN,
            CliError::Config { .. } => EXIT_CONFIG,
        };
    }
    if err.downcast_ref::<BlockIOError>().is_some() {
        return EXIT_IO;
    }
    EXIT_OTHER
}

// SPDX-License-Identifier: MIT

use core::fmt;

use fscio::errors::*;

/// Error type for partition table access and selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartError {
    IO(BlockIOError),
    /// Requested index is not in `0..16`.
    IllegalNumber(i64),
    /// Entry does not carry the filesystem type code.
    BadType { index: usize, type_code: u32 },
    /// Entry is a swap partition.
    Swap { index: usize },
    Invalid(&'static str),
}

impl PartError {
    pub fn msg(&self) -> &'static str {
        match self {
            PartError::IO(e) => e.msg(),
            PartError::IllegalNumber(_) => "Illegal partition number",
            PartError::BadType { .. } => "Partition does not contain this file system",
            PartError::Swap { .. } => "Partition is a swap partition",
            PartError::Invalid(msg) => msg,
        }
    }
}

impl From<BlockIOError> for PartError {
    fn from(e: BlockIOError) -> Self {
        PartError::IO(e)
    }
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartError::IllegalNumber(n) => write!(f, "Illegal partition number {n}"),
            PartError::BadType { index, type_code } => write!(
                f,
                "Partition {index} does not contain an EOS32 file system (type 0x{type_code:X})"
            ),
            PartError::Swap { index } => {
                write!(f, "Partition {index} is a swap partition, not a file system")
            }
            other => write!(f, "{}", other.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartError::IO(e) => Some(e),
            _ => None,
        }
    }
}

pub type PartResult<T = ()> = Result<T, PartError>;

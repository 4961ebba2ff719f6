// SPDX-License-Identifier: MIT

use core::fmt;

pub use fscio::errors::*;

/// Every inconsistency and failure a check run can end with.
///
/// All kinds are fatal: the run stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsckError {
    IO(BlockIOError),
    OrphanBlock(u32),
    DoubleAllocatedBlock(u32),
    BlockMultiplyFreeListed(u32),
    BlockMultiplyReferenced(u32),
    SizeMismatch {
        inode: u32,
        stored: u32,
        computed: u64,
    },
    InodeUnreachableButLinked {
        inode: u32,
        observed: u32,
    },
    InodeNotFreeButUnlinked(u32),
    LinkCountMismatch {
        inode: u32,
        stored: u32,
        observed: u32,
    },
    IllegalInodeType {
        inode: u32,
        mode: u32,
    },
    InodeInDirectoryButFree(u32),
    RootNotDirectory {
        mode: u32,
    },
    DirectoryUnreachableFromRoot {
        inode: u32,
        stored: u32,
    },
    OutOfRangeBlock(u32),
    MaxDepthExceeded {
        inode: u32,
        depth: u32,
    },
    InodeOutOfRange(u32),
    FsTooSmall {
        blocks: u32,
        needed: u64,
    },
    Invalid(&'static str),
    Other(&'static str),
}

impl FsckError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsckError::IO(_) => "IO error",
            FsckError::OrphanBlock(_) => "Block is neither in a file nor in the free list",
            FsckError::DoubleAllocatedBlock(_) => "Block is in a file and in the free list",
            FsckError::BlockMultiplyFreeListed(_) => "Block occurs more than once in the free list",
            FsckError::BlockMultiplyReferenced(_) => "Block is referenced more than once by files",
            FsckError::SizeMismatch { .. } => "File size does not match allocated blocks",
            FsckError::InodeUnreachableButLinked { .. } => {
                "Inode with link count 0 appears in a directory"
            }
            FsckError::InodeNotFreeButUnlinked(_) => "Inode is not free but appears in no directory",
            FsckError::LinkCountMismatch { .. } => "Link count does not match directory entries",
            FsckError::IllegalInodeType { .. } => "Illegal inode type",
            FsckError::InodeInDirectoryButFree(_) => "Free inode appears in a directory",
            FsckError::RootNotDirectory { .. } => "Root inode is not a directory",
            FsckError::DirectoryUnreachableFromRoot { .. } => {
                "Inode with links is not reachable from the root directory"
            }
            FsckError::OutOfRangeBlock(_) => "Block number out of range",
            FsckError::MaxDepthExceeded { .. } => "Directory nesting exceeds the depth limit",
            FsckError::InodeOutOfRange(_) => "Inode number out of range",
            FsckError::FsTooSmall { .. } => "File system too small",
            FsckError::Invalid(msg) => msg,
            FsckError::Other(msg) => msg,
        }
    }

    /// Short finding code, grouped by concern.
    pub fn code(&self) -> &'static str {
        match self {
            FsckError::IO(_) => "IO",
            FsckError::OrphanBlock(_) => "BLK.ORPHAN",
            FsckError::DoubleAllocatedBlock(_) => "BLK.DOUBLE",
            FsckError::BlockMultiplyFreeListed(_) => "BLK.MFREE",
            FsckError::BlockMultiplyReferenced(_) => "BLK.MREF",
            FsckError::SizeMismatch { .. } => "INO.SIZE",
            FsckError::InodeUnreachableButLinked { .. } => "LNK.FREE",
            FsckError::InodeNotFreeButUnlinked(_) => "LNK.UNLINKED",
            FsckError::LinkCountMismatch { .. } => "LNK.COUNT",
            FsckError::IllegalInodeType { .. } => "INO.TYPE",
            FsckError::InodeInDirectoryButFree(_) => "DIR.FREEINO",
            FsckError::RootNotDirectory { .. } => "ROOT.TYPE",
            FsckError::DirectoryUnreachableFromRoot { .. } => "LNK.UNREACH",
            FsckError::OutOfRangeBlock(_) => "BLK.RANGE",
            FsckError::MaxDepthExceeded { .. } => "DIR.DEPTH",
            FsckError::InodeOutOfRange(_) => "DIR.INORANGE",
            FsckError::FsTooSmall { .. } => "SB.SIZE",
            FsckError::Invalid(_) => "INVALID",
            FsckError::Other(_) => "OTHER",
        }
    }

    /// Process exit status for this kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            FsckError::OrphanBlock(_) => 1,
            FsckError::DoubleAllocatedBlock(_) => 2,
            FsckError::BlockMultiplyFreeListed(_) => 3,
            FsckError::BlockMultiplyReferenced(_) => 4,
            FsckError::SizeMismatch { .. } => 5,
            FsckError::InodeUnreachableButLinked { .. } => 6,
            FsckError::InodeNotFreeButUnlinked(_) => 7,
            FsckError::LinkCountMismatch { .. } => 8,
            FsckError::IllegalInodeType { .. } => 9,
            FsckError::InodeInDirectoryButFree(_) => 10,
            FsckError::RootNotDirectory { .. } => 11,
            FsckError::DirectoryUnreachableFromRoot { .. } => 12,
            FsckError::OutOfRangeBlock(_) => 13,
            FsckError::MaxDepthExceeded { .. } => 14,
            FsckError::InodeOutOfRange(_) => 15,
            FsckError::IO(_) => 18,
            FsckError::FsTooSmall { .. } => 21,
            FsckError::Invalid(_) | FsckError::Other(_) => 99,
        }
    }

    /// True for findings about the file system itself (not IO or internal failures).
    pub fn is_inconsistency(&self) -> bool {
        !matches!(
            self,
            FsckError::IO(_) | FsckError::Invalid(_) | FsckError::Other(_)
        )
    }

    pub fn source(&self) -> Option<BlockIOError> {
        match self {
            FsckError::IO(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<BlockIOError> for FsckError {
    #[inline]
    fn from(e: BlockIOError) -> Self {
        FsckError::IO(e)
    }
}

impl From<&'static str> for FsckError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        FsckError::Other(msg)
    }
}

impl fmt::Display for FsckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            FsckError::OrphanBlock(b)
            | FsckError::DoubleAllocatedBlock(b)
            | FsckError::BlockMultiplyFreeListed(b)
            | FsckError::BlockMultiplyReferenced(b)
            | FsckError::OutOfRangeBlock(b) => write!(f, " (block {b}, 0x{b:X})")?,
            FsckError::InodeNotFreeButUnlinked(i)
            | FsckError::InodeInDirectoryButFree(i)
            | FsckError::InodeOutOfRange(i) => write!(f, " (inode {i})")?,
            FsckError::SizeMismatch {
                inode,
                stored,
                computed,
            } => write!(f, " (inode {inode}: stored {stored}, computed {computed} bytes)")?,
            FsckError::InodeUnreachableButLinked { inode, observed } => {
                write!(f, " (inode {inode}: {observed} entries)")?
            }
            FsckError::LinkCountMismatch {
                inode,
                stored,
                observed,
            } => write!(f, " (inode {inode}: stored {stored}, found {observed})")?,
            FsckError::IllegalInodeType { inode, mode } => {
                write!(f, " (inode {inode}, mode 0o{mode:o})")?
            }
            FsckError::RootNotDirectory { mode } => write!(f, " (mode 0o{mode:o})")?,
            FsckError::DirectoryUnreachableFromRoot { inode, stored } => {
                write!(f, " (inode {inode}: link count {stored})")?
            }
            FsckError::MaxDepthExceeded { inode, depth } => {
                write!(f, " (inode {inode} at depth {depth})")?
            }
            FsckError::FsTooSmall { blocks, needed } => {
                write!(f, " ({blocks} blocks, at least {needed} needed)")?
            }
            _ => {}
        }
        if let Some(src) = self.source() {
            write!(f, "\n  caused by: {}", src.msg())?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsckError::IO(e) => Some(e),
            _ => None,
        }
    }
}

pub type FsckResult<T = ()> = Result<T, FsckError>;

/// Errors raised while building an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MkfsError {
    IO(BlockIOError),
    OutOfBlocks,
    OutOfInodes,
    NotADirectory(u32),
    BadInode(u32),
    Invalid(&'static str),
}

impl MkfsError {
    pub fn msg(&self) -> &'static str {
        match self {
            MkfsError::IO(_) => "IO error",
            MkfsError::OutOfBlocks => "Out of blocks",
            MkfsError::OutOfInodes => "Out of inodes",
            MkfsError::NotADirectory(_) => "Not a directory",
            MkfsError::BadInode(_) => "Inode number out of range",
            MkfsError::Invalid(msg) => msg,
        }
    }
}

impl From<BlockIOError> for MkfsError {
    #[inline]
    fn from(e: BlockIOError) -> Self {
        MkfsError::IO(e)
    }
}

impl fmt::Display for MkfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            MkfsError::NotADirectory(i) | MkfsError::BadInode(i) => write!(f, " (inode {i})"),
            MkfsError::IO(e) => write!(f, "\n  caused by: {}", e.msg()),
            _ => Ok(()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MkfsError {}

pub type MkfsResult<T = ()> = Result<T, MkfsError>;

// SPDX-License-Identifier: MIT

use core::fmt;

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constant::*;

/// On-disk inode (64 bytes, big-endian).
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct RawInode {
    pub mode: U32,
    pub nlink: U32,
    pub uid: U32,
    pub gid: U32,
    pub ctime: U32,
    pub mtime: U32,
    pub atime: U32,
    pub size: U32,
    /// 6 direct, 1 single-indirect, 1 double-indirect.
    pub refs: [U32; INODE_REFS],
}

impl RawInode {
    pub fn new_zeroed() -> Self {
        Self::new(IFFREE, 0)
    }

    pub fn new(mode: u32, nlink: u32) -> Self {
        Self {
            mode: U32::new(mode),
            nlink: U32::new(nlink),
            uid: U32::new(0),
            gid: U32::new(0),
            ctime: U32::new(0),
            mtime: U32::new(0),
            atime: U32::new(0),
            size: U32::new(0),
            refs: [U32::new(0); INODE_REFS],
        }
    }

    #[inline]
    pub fn kind(&self) -> Option<InodeKind> {
        InodeKind::from_mode(self.mode.get())
    }

    #[inline]
    pub fn refs(&self) -> [u32; INODE_REFS] {
        self.refs.map(|r| r.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InodeKind {
    #[default]
    Free,
    Regular,
    Directory,
    CharSpecial,
    BlockSpecial,
}

impl InodeKind {
    /// Classifies `mode & IFMT`. `None` for an illegal type.
    #[inline]
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & IFMT {
            IFREG => Some(InodeKind::Regular),
            IFDIR => Some(InodeKind::Directory),
            IFCHR => Some(InodeKind::CharSpecial),
            IFBLK => Some(InodeKind::BlockSpecial),
            IFFREE => Some(InodeKind::Free),
            _ => None,
        }
    }

    #[inline]
    pub fn mode_bits(&self) -> u32 {
        match self {
            InodeKind::Free => IFFREE,
            InodeKind::Regular => IFREG,
            InodeKind::Directory => IFDIR,
            InodeKind::CharSpecial => IFCHR,
            InodeKind::BlockSpecial => IFBLK,
        }
    }

    /// Special inodes carry no block references.
    #[inline]
    pub fn is_special(&self) -> bool {
        matches!(self, InodeKind::CharSpecial | InodeKind::BlockSpecial)
    }

    /// Kinds whose stored size is checked against the allocated blocks.
    #[inline]
    pub fn has_content(&self) -> bool {
        matches!(self, InodeKind::Regular | InodeKind::Directory)
    }
}

impl fmt::Display for InodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            InodeKind::Free => "free",
            InodeKind::Regular => "regular",
            InodeKind::Directory => "directory",
            InodeKind::CharSpecial => "char special",
            InodeKind::BlockSpecial => "block special",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inode_is_64_bytes() {
        assert_eq!(core::mem::size_of::<RawInode>(), INODE_SIZE);
    }

    #[test]
    fn classifies_mode() {
        assert_eq!(InodeKind::from_mode(0o40755), Some(InodeKind::Regular));
        assert_eq!(InodeKind::from_mode(0o30755), Some(InodeKind::Directory));
        assert_eq!(InodeKind::from_mode(0o20600), Some(InodeKind::CharSpecial));
        assert_eq!(InodeKind::from_mode(0o10600), Some(InodeKind::BlockSpecial));
        assert_eq!(InodeKind::from_mode(0o00644), Some(InodeKind::Free));
        assert_eq!(InodeKind::from_mode(0o50000), None);
        assert_eq!(InodeKind::from_mode(0o70000), None);
    }

    #[test]
    fn fields_are_big_endian() {
        let mut ino = RawInode::new(IFDIR | 0o755, 2);
        ino.refs[7] = U32::new(0x0A0B_0C0D);
        let bytes = ino.as_bytes();
        assert_eq!(&bytes[0..4], &(IFDIR | 0o755).to_be_bytes());
        assert_eq!(&bytes[4..8], &[0, 0, 0, 2]);
        assert_eq!(&bytes[60..64], &[0x0A, 0x0B, 0x0C, 0x0D]);
    }
}

// SPDX-License-Identifier: MIT

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constant::*;

/// On-disk directory entry (64 bytes).
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct DirEntry {
    pub inode: U32,
    pub name: [u8; DIRENT_NAME_SIZE],
}

impl DirEntry {
    /// Builds an entry; the name is truncated to 60 bytes and NUL padded.
    pub fn new(inode: u32, name: &[u8]) -> Self {
        let mut n = [0u8; DIRENT_NAME_SIZE];
        let len = name.len().min(DIRENT_NAME_SIZE);
        n[..len].copy_from_slice(&name[..len]);
        Self {
            inode: U32::new(inode),
            name: n,
        }
    }

    /// First four name bytes as a big-endian word.
    #[inline]
    pub fn name_word(&self) -> u32 {
        u32::from_be_bytes([self.name[0], self.name[1], self.name[2], self.name[3]])
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.name_word() == DOT_SENTINEL
    }

    #[inline]
    pub fn is_dotdot(&self) -> bool {
        self.name_word() == DOTDOT_SENTINEL
    }

    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(DIRENT_NAME_SIZE);
        &self.name[..end]
    }
}

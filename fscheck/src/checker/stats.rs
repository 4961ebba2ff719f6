// SPDX-License-Identifier: MIT

/// Counters collected while scanning and walking the file system.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkerStats {
    /// Number of directories descended into.
    pub dirs_visited: usize,
    /// Number of regular files reached from the root.
    pub files_found: usize,
    /// Number of nonzero directory entries scanned.
    pub entries_scanned: usize,
    /// Maximum directory depth reached.
    pub max_depth: usize,
    /// Number of inode slots scanned.
    pub inodes_checked: usize,
    /// Pointer blocks (single, double and second level) resolved.
    pub indirect_blocks: usize,
}

impl WalkerStats {
    pub fn new() -> Self {
        Self::default()
    }
}

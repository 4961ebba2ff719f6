// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! Block and link consistency checker for EOS32 file systems.
//!
//! A run scans the inode table and the free list into per-block counters,
//! walks the directory tree from the root counting the entries that name
//! each inode, then cross-checks the tables. See [`checker::check_volume`].

extern crate alloc;

#[macro_use]
mod macros;

pub mod accounting;
pub mod auditor;
pub mod checker;
pub mod constant;
pub mod context;
pub mod errors;
pub mod freelist;
pub mod meta;
pub mod resolver;
pub mod scanner;
pub mod types;
pub mod verifier;

#[cfg(feature = "mkfs")]
pub mod mkfs;

pub mod prelude {
    pub use crate::checker::{
        CheckOptions, Eos32Checker, Finding, FsChecker, ReportDisplayOpts, Severity,
        VerifierOptionsLike, VerifyPhases, VerifyReport, check_volume,
    };
    pub use crate::constant::*;
    pub use crate::context::{CheckContext, InodeDerived};
    pub use crate::errors::*;
    pub use crate::meta::Eos32Meta;
    pub use crate::types::InodeKind;

    #[cfg(feature = "mkfs")]
    pub use crate::mkfs::ImageBuilder;
}

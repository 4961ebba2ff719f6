// SPDX-License-Identifier: MIT

pub mod log;
pub mod report;

pub use log::{LogLevel, log_level, set_log_level};

// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use fscheck::checker::{CheckOptions, VerifyPhases};
use serde::Deserialize;

use crate::error::CliError;
use crate::utils::LogLevel;

/// Check subsets selectable with `--only`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Only {
    /// Block accounting: files against the free list
    Blocks,
    /// Link counts against the directory tree
    Links,
    /// Stored sizes against allocated blocks
    Sizes,
}

impl Only {
    pub fn phases(self) -> VerifyPhases {
        match self {
            Only::Blocks => VerifyPhases::BLOCKS,
            Only::Links => VerifyPhases::LINKS,
            Only::Sizes => VerifyPhases::SIZES,
        }
    }
}

/// Optional settings file. Command-line flags take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log: Option<LogLevel>,
    pub max_depth: Option<u32>,
    pub only: Vec<Only>,
    pub warn_free_counts: Option<bool>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|msg| CliError::Config {
            path: path.to_path_buf(),
            msg,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.message().to_string())?;
        if config.max_depth == Some(0) {
            return Err("max_depth must be at least 1".into());
        }
        Ok(config)
    }

    /// Check options after applying command-line overrides.
    pub fn check_options(&self, max_depth: Option<u32>, only: &[Only]) -> CheckOptions {
        let mut opt = CheckOptions::default();

        let only = if only.is_empty() { &self.only[..] } else { only };
        if !only.is_empty() {
            opt.phases = only
                .iter()
                .fold(VerifyPhases::empty(), |p, o| p | o.phases());
        }
        if let Some(depth) = max_depth.or(self.max_depth) {
            opt.max_depth = depth;
        }
        if let Some(warn) = self.warn_free_counts {
            opt.warn_free_counts = warn;
        }
        opt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let c = Config::from_toml(
            r#"
log = "verbose"
max_depth = 12
only = ["blocks", "sizes"]
warn_free_counts = false
"#,
        )
        .unwrap();
        assert_eq!(c.log, Some(LogLevel::Verbose));
        assert_eq!(c.only, [Only::Blocks, Only::Sizes]);

        let opt = c.check_options(None, &[]);
        assert_eq!(opt.max_depth, 12);
        assert_eq!(opt.phases, VerifyPhases::BLOCKS | VerifyPhases::SIZES);
        assert!(!opt.warn_free_counts);
    }

    #[test]
    fn flags_override_file() {
        let c = Config::from_toml("max_depth = 12\nonly = [\"blocks\"]").unwrap();
        let opt = c.check_options(Some(4), &[Only::Links]);
        assert_eq!(opt.max_depth, 4);
        assert_eq!(opt.phases, VerifyPhases::LINKS);
    }

    #[test]
    fn empty_file_means_defaults() {
        let opt = Config::from_toml("").unwrap().check_options(None, &[]);
        assert_eq!(opt.phases, VerifyPhases::ALL);
        assert!(opt.warn_free_counts);
    }

    #[test]
    fn rejects_unknown_and_bad_values() {
        assert!(Config::from_toml("colour = true").is_err());
        assert!(Config::from_toml("only = [\"inodes\"]").is_err());
        assert!(Config::from_toml("max_depth = 0").is_err());
    }
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// how the builder spends the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// no context at all
    Off,
    /// ranked files, summarized once they stop fitting
    #[default]
    Smart,
    /// every file in scanner order with an equal share each
    WholeRepo,
    /// multi-round retrieval; currently runs as `Smart`
    Iterative,
    /// project overview and file tree only
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown context strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Off,
        Strategy::Smart,
        Strategy::WholeRepo,
        Strategy::Iterative,
        Strategy::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Off => "off",
            Strategy::Smart => "smart",
            Strategy::WholeRepo => "whole_repo",
            Strategy::Iterative => "iterative",
            Strategy::Minimal => "minimal",
        }
    }

    /// the strategy whose allocation rules actually run
    pub fn effective(&self) -> Strategy {
        match self {
            Strategy::Iterative => Strategy::Smart,
            other => *other,
        }
    }

    /// whether the overview carries the full file tree listing
    pub fn lists_file_tree(&self) -> bool {
        matches!(self.effective(), Strategy::Smart | Strategy::Minimal)
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "off" | "none" => Ok(Strategy::Off),
            "smart" => Ok(Strategy::Smart),
            "whole_repo" | "whole" => Ok(Strategy::WholeRepo),
            "iterative" => Ok(Strategy::Iterative),
            "minimal" => Ok(Strategy::Minimal),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("smart".parse::<Strategy>().unwrap(), Strategy::Smart);
        assert_eq!("whole_repo".parse::<Strategy>().unwrap(), Strategy::WholeRepo);
        assert_eq!("Whole-Repo".parse::<Strategy>().unwrap(), Strategy::WholeRepo);
        assert_eq!(" OFF ".parse::<Strategy>().unwrap(), Strategy::Off);
        assert_eq!("minimal".parse::<Strategy>().unwrap(), Strategy::Minimal);
    }

    #[test]
    fn test_unknown_name() {
        let err = "bogus".parse::<Strategy>().unwrap_err();
        assert_eq!(err, UnknownStrategy("bogus".into()));
        assert_eq!(err.to_string(), "unknown context strategy: bogus");
    }

    #[test]
    fn test_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_iterative_runs_as_smart() {
        assert_eq!(Strategy::Iterative.effective(), Strategy::Smart);
        assert_eq!(Strategy::WholeRepo.effective(), Strategy::WholeRepo);
        assert!(Strategy::Iterative.lists_file_tree());
        assert!(!Strategy::WholeRepo.lists_file_tree());
    }

    #[test]
    fn test_default_is_smart() {
        assert_eq!(Strategy::default(), Strategy::Smart);
    }
}

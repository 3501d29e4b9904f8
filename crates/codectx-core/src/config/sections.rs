// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// model identifier used when none is given on the command line
    #[serde(default = "default_model")]
    pub model: String,
    /// off, smart, whole_repo, iterative or minimal
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// share of the model window spent on context, in (0, 1]
    #[serde(default = "default_usage_fraction")]
    pub usage_fraction: f64,
    /// share of the usable budget reserved for the project overview
    #[serde(default = "default_overview_fraction")]
    pub overview_fraction: f64,
    /// stop adding files once fewer tokens than this remain
    #[serde(default = "default_min_useful_tokens")]
    pub min_useful_tokens: usize,
    /// per-factor priority weight overrides, keyed by factor name
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_head_fraction")]
    pub head_fraction: f64,
    #[serde(default = "default_tail_fraction")]
    pub tail_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// upper bound on cached files; least useful entries are evicted first
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// include dependency directories (node_modules, vendor, etc). default: false
    #[serde(default)]
    pub include_dependencies: bool,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_strategy() -> String {
    "smart".into()
}
fn default_usage_fraction() -> f64 {
    crate::context::budget::DEFAULT_USAGE_FRACTION
}
fn default_overview_fraction() -> f64 {
    0.1
}
fn default_min_useful_tokens() -> usize {
    crate::context::summarizer::DEFAULT_MIN_USEFUL_TOKENS
}
fn default_head_fraction() -> f64 {
    0.6
}
fn default_tail_fraction() -> f64 {
    0.2
}
fn default_ttl_secs() -> u64 {
    300
}
fn default_cache_max_entries() -> u64 {
    10_000
}
fn default_max_file_size() -> u64 {
    1_048_576
} // 1MB

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            strategy: default_strategy(),
            usage_fraction: default_usage_fraction(),
            overview_fraction: default_overview_fraction(),
            min_useful_tokens: default_min_useful_tokens(),
            weights: BTreeMap::new(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            head_fraction: default_head_fraction(),
            tail_fraction: default_tail_fraction(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            include_dependencies: false,
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("summarizer.head_fraction", self.head_fraction),
            ("summarizer.tail_fraction", self.tail_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.head_fraction + self.tail_fraction >= 1.0 {
            return Err(
                "summarizer.head_fraction + summarizer.tail_fraction must leave room for the omission marker"
                    .into(),
            );
        }
        Ok(())
    }
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use codectx_common::types::{CandidateFile, FileCategory};
use codectx_common::{Error, Result};

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// files at this depth or deeper get nothing from the depth factor
const MAX_SCORED_DEPTH: usize = 5;

/// project manifests and top-level docs, scored only at the project root
const ROOT_CORE_FILES: &[&str] = &[
    "readme",
    "readme.md",
    "readme.rst",
    "readme.txt",
    "cargo.toml",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "gemfile",
    "makefile",
    "cmakelists.txt",
    "dockerfile",
    "tsconfig.json",
];

/// entry points, scored at the root or one directory down (e.g. `src/`)
const ENTRY_POINT_STEMS: &[&str] = &["main", "lib", "index", "app", "mod", "__init__", "server"];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "what", "how", "why", "does", "where", "when",
    "can", "you", "are", "from", "into", "about", "there", "which", "should", "would", "could",
    "please", "file", "code", "make", "add", "fix", "use", "show", "explain",
];

/// one term of the priority score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Factor {
    Mentioned,
    Recent,
    CoreFile,
    KeywordMatch,
    TypeRelevance,
    ModificationRecency,
    ShallowDepth,
}

impl Factor {
    pub const ALL: [Factor; 7] = [
        Factor::Mentioned,
        Factor::Recent,
        Factor::CoreFile,
        Factor::KeywordMatch,
        Factor::TypeRelevance,
        Factor::ModificationRecency,
        Factor::ShallowDepth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Mentioned => "mentioned",
            Factor::Recent => "recent",
            Factor::CoreFile => "core_file",
            Factor::KeywordMatch => "keyword_match",
            Factor::TypeRelevance => "type_relevance",
            Factor::ModificationRecency => "modification_recency",
            Factor::ShallowDepth => "shallow_depth",
        }
    }

    /// the most this factor can add with the default table
    pub fn default_weight(&self) -> f64 {
        match self {
            Factor::Mentioned => 100.0,
            Factor::Recent => 50.0,
            Factor::CoreFile => 30.0,
            Factor::KeywordMatch => 20.0,
            Factor::TypeRelevance => 5.0,
            Factor::ModificationRecency => 3.0,
            Factor::ShallowDepth => 5.0,
        }
    }
}

impl FromStr for Factor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Factor::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown priority factor: {}", s)))
    }
}

/// weight per factor. each factor produces a signal in [0, 1] and the score
/// is the weighted sum, so a weight is the most that factor can contribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable(BTreeMap<Factor, f64>);

impl Default for WeightTable {
    fn default() -> Self {
        Self(
            Factor::ALL
                .into_iter()
                .map(|f| (f, f.default_weight()))
                .collect(),
        )
    }
}

impl WeightTable {
    /// defaults with named entries replaced, as read from config
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let mut table = Self::default();
        for (name, weight) in overrides {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(Error::Config(format!(
                    "weight for {} must be a non-negative number",
                    name
                )));
            }
            table.set(name.parse()?, *weight);
        }
        Ok(table)
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.0.get(&factor).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, factor: Factor, weight: f64) {
        self.0.insert(factor, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.0.iter().map(|(f, w)| (*f, *w))
    }
}

/// lowercase words from the query worth matching against paths
pub fn query_keywords(query: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map(str::to_lowercase)
    {
        if word.chars().count() < 3 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if !keywords.contains(&word) {
            keywords.push(word);
        }
    }
    keywords
}

/// whether a user-supplied path refers to this candidate. accepts the
/// absolute path, the root-relative path, or a trailing part of it.
pub fn matches_hint(file: &CandidateFile, hint: &str) -> bool {
    let hint = hint.trim().replace('\\', "/");
    let hint = hint.trim_start_matches("./");
    if hint.is_empty() {
        return false;
    }
    if file.relative_path == hint || file.path == Path::new(hint) {
        return true;
    }
    file.relative_path.ends_with(&format!("/{}", hint))
}

fn is_core_file(file: &CandidateFile) -> bool {
    let name = file.file_name().to_lowercase();
    if file.depth_from_root == 0 && ROOT_CORE_FILES.contains(&name.as_str()) {
        return true;
    }
    let stem = name.split('.').next().unwrap_or("");
    file.depth_from_root <= 1 && name.contains('.') && ENTRY_POINT_STEMS.contains(&stem)
}

pub struct Prioritizer {
    weights: WeightTable,
    now: SystemTime,
}

impl Prioritizer {
    /// `now` is the instant modification recency is measured against. fix it
    /// once per build so ranking stays reproducible.
    pub fn new(weights: WeightTable, now: SystemTime) -> Self {
        Self { weights, now }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    fn signal(&self, factor: Factor, file: &CandidateFile, keywords: &[String]) -> f64 {
        match factor {
            Factor::Mentioned => f64::from(u8::from(file.is_mentioned)),
            Factor::Recent => f64::from(u8::from(file.is_recent)),
            Factor::CoreFile => f64::from(u8::from(is_core_file(file))),
            Factor::KeywordMatch => {
                let name = file.file_name().to_lowercase();
                let path = file.relative_path.to_lowercase();
                if keywords.iter().any(|k| name.contains(k.as_str())) {
                    1.0
                } else if keywords.iter().any(|k| path.contains(k.as_str())) {
                    0.5
                } else {
                    0.0
                }
            }
            Factor::TypeRelevance => match file.language.category() {
                FileCategory::Code => 1.0,
                FileCategory::Config => 0.6,
                FileCategory::Docs => 0.4,
                FileCategory::Other => 0.0,
            },
            Factor::ModificationRecency => {
                let age = self
                    .now
                    .duration_since(file.modified_time)
                    .unwrap_or(Duration::ZERO);
                if age < HOUR {
                    1.0
                } else if age < DAY {
                    2.0 / 3.0
                } else if age < WEEK {
                    1.0 / 3.0
                } else {
                    0.0
                }
            }
            Factor::ShallowDepth => {
                let depth = file.depth_from_root.min(MAX_SCORED_DEPTH);
                (MAX_SCORED_DEPTH - depth) as f64 / MAX_SCORED_DEPTH as f64
            }
        }
    }

    /// weighted contribution of every factor for one file
    pub fn breakdown(&self, file: &CandidateFile, keywords: &[String]) -> Vec<(Factor, f64)> {
        self.weights
            .iter()
            .map(|(factor, weight)| (factor, weight * self.signal(factor, file, keywords)))
            .collect()
    }

    pub fn score(&self, file: &CandidateFile, keywords: &[String]) -> f64 {
        self.breakdown(file, keywords)
            .into_iter()
            .map(|(_, points)| points)
            .sum()
    }

    /// score every candidate and order them best first. ties go to the
    /// shallower file, then to the lexically smaller path.
    pub fn rank(
        &self,
        candidates: Vec<CandidateFile>,
        query: &str,
        mentioned_paths: &[String],
        recent_paths: &[String],
    ) -> Vec<CandidateFile> {
        let keywords = query_keywords(query);
        let mut ranked: Vec<CandidateFile> = candidates
            .into_iter()
            .map(|mut file| {
                file.is_mentioned = mentioned_paths.iter().any(|h| matches_hint(&file, h));
                file.is_recent = recent_paths.iter().any(|h| matches_hint(&file, h));
                file.priority_score = self.score(&file, &keywords);
                file
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.priority_score
                .total_cmp(&a.priority_score)
                .then(a.depth_from_root.cmp(&b.depth_from_root))
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });
        ranked
    }
}

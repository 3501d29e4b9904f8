// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use codectx_common::types::CandidateFile;
use codectx_common::{Error, Result};
use ignore::WalkBuilder;
use serde::Serialize;

use crate::config::{Config, DEPENDENCY_DIRS, IGNORE_FILE};

/// every candidate file under a project root, as seen at scan time
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSnapshot {
    pub root: PathBuf,
    pub name: String,
    /// sorted by relative path
    pub files: Vec<CandidateFile>,
}

impl ProjectSnapshot {
    pub fn new(root: impl Into<PathBuf>, mut files: Vec<CandidateFile>) -> Self {
        let root = root.into();
        let name = project_name(&root);
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Self { root, name, files }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

pub fn scan_project(root: &Path, config: &Config) -> Result<ProjectSnapshot> {
    let root = root
        .canonicalize()
        .map_err(|e| Error::Discovery(format!("{}: {}", root.display(), e)))?;
    if !root.is_dir() {
        return Err(Error::Discovery(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for path in walk_directory(&root, config)? {
        let Ok(metadata) = path.metadata() else {
            continue;
        };
        let Ok(relative) = path.strip_prefix(&root) else {
            continue;
        };
        let relative = relative.to_string_lossy().into_owned();
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push(CandidateFile::new(
            path.clone(),
            relative,
            metadata.len(),
            modified,
        ));
    }

    tracing::debug!("scanned {}: {} candidate files", root.display(), files.len());
    Ok(ProjectSnapshot::new(root, files))
}

pub fn walk_directory(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .follow_links(false)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        // honour .gitignore even when the project is not a git checkout
        .require_git(false);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in &config.ignore_patterns {
        let neg = format!("!{}", pattern);
        overrides
            .add(&neg)
            .map_err(|e| Error::Discovery(e.to_string()))?;
    }

    // exclude dependency directories unless configured to include them
    if !config.scan.include_dependencies {
        for dir in DEPENDENCY_DIRS {
            let neg = format!("!{}", dir);
            overrides
                .add(&neg)
                .map_err(|e| Error::Discovery(e.to_string()))?;
        }
    }

    let overrides = overrides
        .build()
        .map_err(|e| Error::Discovery(e.to_string()))?;
    builder.overrides(overrides);
    builder.add_custom_ignore_filename(IGNORE_FILE);

    let mut files = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Ok(metadata) = path.metadata() {
            if metadata.len() > config.scan.max_file_size_bytes {
                continue;
            }
        }

        if is_likely_binary(path) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    Ok(files)
}

fn is_likely_binary(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return true;
    };
    use std::io::Read;
    let mut buf = [0u8; 512];
    let Ok(n) = file.read(&mut buf) else {
        return true;
    };
    if n == 0 {
        return false;
    }
    let null_count = buf[..n].iter().filter(|&&b| b == 0).count();
    null_count > n / 10
}

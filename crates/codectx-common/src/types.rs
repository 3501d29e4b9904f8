// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// source languages recognised when judging how relevant a file type is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    Java,
    Kotlin,
    Ruby,
    Shell,
    Markdown,
    Text,
    Toml,
    Yaml,
    Json,
    Html,
    Css,
    Sql,
    Env,
    Unknown,
}

/// coarse grouping used by the type relevance factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Code,
    Config,
    Docs,
    Other,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" | "tsx" | "jsx" => Language::TypeScript,
            "go" => Language::Go,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Language::Cpp,
            "java" => Language::Java,
            "kt" | "kts" => Language::Kotlin,
            "rb" => Language::Ruby,
            "sh" | "bash" | "zsh" | "fish" => Language::Shell,
            "md" | "mdx" | "rst" => Language::Markdown,
            "txt" => Language::Text,
            "toml" => Language::Toml,
            "yml" | "yaml" => Language::Yaml,
            "json" => Language::Json,
            "html" | "htm" => Language::Html,
            "css" | "scss" | "less" => Language::Css,
            "sql" => Language::Sql,
            _ => Language::Unknown,
        }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower == ".env" || lower.starts_with(".env.") || lower.ends_with(".env") {
            return Some(Language::Env);
        }
        match lower.as_str() {
            "makefile" | "dockerfile" | "justfile" => Some(Language::Shell),
            "readme" | "license" | "changelog" => Some(Language::Text),
            _ => None,
        }
    }

    /// detect from a path, falling back to well-known file names
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = Language::from_extension(ext);
        if language != Language::Unknown {
            return language;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        Language::from_filename(name).unwrap_or(Language::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Ruby => "ruby",
            Language::Shell => "shell",
            Language::Markdown => "markdown",
            Language::Text => "text",
            Language::Toml => "toml",
            Language::Yaml => "yaml",
            Language::Json => "json",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
            Language::Env => "env",
            Language::Unknown => "unknown",
        }
    }

    pub fn category(&self) -> FileCategory {
        match self {
            Language::Rust
            | Language::Python
            | Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::C
            | Language::Cpp
            | Language::Java
            | Language::Kotlin
            | Language::Ruby
            | Language::Shell
            | Language::Sql => FileCategory::Code,
            Language::Toml
            | Language::Yaml
            | Language::Json
            | Language::Env
            | Language::Html
            | Language::Css => FileCategory::Config,
            Language::Markdown | Language::Text => FileCategory::Docs,
            Language::Unknown => FileCategory::Other,
        }
    }
}

/// a file offered to the context builder by the project scanner.
///
/// recomputed for every build and never persisted. `is_mentioned`,
/// `is_recent` and `priority_score` are filled in by the prioritizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFile {
    /// absolute path on disk, used as the cache key
    pub path: PathBuf,
    /// path relative to the project root, always `/`-separated
    pub relative_path: String,
    pub size_bytes: u64,
    pub modified_time: SystemTime,
    /// number of directories between the project root and the file
    pub depth_from_root: usize,
    pub language: Language,
    #[serde(default)]
    pub is_mentioned: bool,
    #[serde(default)]
    pub is_recent: bool,
    #[serde(default)]
    pub priority_score: f64,
}

impl CandidateFile {
    pub fn new(
        path: impl Into<PathBuf>,
        relative_path: impl Into<String>,
        size_bytes: u64,
        modified_time: SystemTime,
    ) -> Self {
        let path = path.into();
        let relative_path = relative_path.into().replace('\\', "/");
        let depth_from_root = relative_path.matches('/').count();
        let language = Language::from_path(&path);
        Self {
            path,
            relative_path,
            size_bytes,
            modified_time,
            depth_from_root,
            language,
            is_mentioned: false,
            is_recent: false,
            priority_score: 0.0,
        }
    }

    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// a file that made it into the payload only as a head+tail summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedFile {
    pub path: String,
    pub omitted_lines: usize,
}

/// bounded context text plus the accounting the UI shows next to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    pub text: String,
    pub tokens_used: usize,
    pub tokens_budget: usize,
    pub included_files: Vec<String>,
    pub summarized_files: Vec<SummarizedFile>,
    /// files the summarizer refused because their allotment was too small
    #[serde(default)]
    pub excluded_files: Vec<String>,
}

impl ContextPayload {
    pub fn empty(tokens_budget: usize) -> Self {
        Self {
            tokens_budget,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// number of files carrying content, full or summarized
    pub fn file_count(&self) -> usize {
        self.included_files.len() + self.summarized_files.len()
    }

    pub fn usage_percent(&self) -> u32 {
        if self.tokens_budget == 0 {
            return 0;
        }
        ((self.tokens_used as f64 / self.tokens_budget as f64) * 100.0).round() as u32
    }

    /// e.g. "142,830/160,000 tokens used (89%)"
    pub fn usage_summary(&self) -> String {
        format!(
            "{}/{} tokens used ({}%)",
            group_thousands(self.tokens_used),
            group_thousands(self.tokens_budget),
            self.usage_percent()
        )
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

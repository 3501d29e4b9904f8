// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod sections;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::context::prioritizer::WeightTable;
use crate::context::summarizer::SummarizerConfig;

pub use sections::{CacheConfig, ContextConfig, ScanConfig, SummaryConfig};

/// name of the per-project ignore file, gitignore syntax
pub const IGNORE_FILE: &str = ".codectxignore";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub summarizer: SummaryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// Common dependency/vendor directories across languages.
/// Excluded by default unless `include_dependencies` is true.
pub const DEPENDENCY_DIRS: &[&str] = &[
    // JavaScript/TypeScript
    "node_modules",
    "bower_components",
    // Rust
    "target",
    // Python
    ".venv",
    "venv",
    "__pycache__",
    ".eggs",
    "*.egg-info",
    ".tox",
    ".nox",
    // Go, Ruby, PHP
    "vendor",
    // Java/Kotlin/Scala
    ".gradle",
    ".m2",
    "build",
    // .NET/C#
    "bin",
    "obj",
    "packages",
    // Elixir
    "deps",
    "_build",
    // Haskell
    ".stack-work",
    "dist-newstyle",
    // Swift/iOS
    "Pods",
    ".build",
    "DerivedData",
    // Dart/Flutter
    ".dart_tool",
    // Zig
    "zig-cache",
    "zig-out",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            context: ContextConfig::default(),
            summarizer: SummaryConfig::default(),
            cache: CacheConfig::default(),
            scan: ScanConfig::default(),
            ignore_patterns: vec![
                // lock files
                "*.lock".into(),
                "package-lock.json".into(),
                // minified/generated assets
                "*.min.js".into(),
                "*.min.css".into(),
                "*.map".into(),
                "*.wasm".into(),
                // compiled artifacts
                "*.pyc".into(),
                "*.o".into(),
                "*.so".into(),
                "*.dylib".into(),
                "*.dll".into(),
                "*.exe".into(),
                // images/media
                "*.png".into(),
                "*.jpg".into(),
                "*.jpeg".into(),
                "*.gif".into(),
                "*.ico".into(),
                "*.pdf".into(),
                // archives
                "*.zip".into(),
                "*.tar".into(),
                "*.gz".into(),
                // vcs
                ".git".into(),
                // build output (not dependencies)
                "dist".into(),
            ],
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("codectx")
            .join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "failed to parse config")?;
            config
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ctx = &self.context;
        if !ctx.usage_fraction.is_finite() || ctx.usage_fraction <= 0.0 || ctx.usage_fraction > 1.0
        {
            anyhow::bail!("context.usage_fraction must be within (0, 1]");
        }
        if !(0.0..1.0).contains(&ctx.overview_fraction) {
            anyhow::bail!("context.overview_fraction must be within [0, 1)");
        }
        if ctx.min_useful_tokens == 0 {
            anyhow::bail!("context.min_useful_tokens must be > 0");
        }
        if ctx.model.trim().is_empty() {
            anyhow::bail!("context.model must not be empty");
        }
        // unknown strategy names are tolerated at build time, not here
        WeightTable::with_overrides(&ctx.weights)?;
        self.summarizer
            .validate()
            .map_err(|e| anyhow::anyhow!(e))?;
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be > 0");
        }
        if self.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be > 0");
        }
        if self.scan.max_file_size_bytes == 0 {
            anyhow::bail!("scan.max_file_size_bytes must be > 0");
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        let content = toml::to_string_pretty(self).with_context(|| "failed to serialise config")?;
        std::fs::write(path, &content)?;
        Ok(())
    }

    pub fn weight_table(&self) -> Result<WeightTable> {
        Ok(WeightTable::with_overrides(&self.context.weights)?)
    }

    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            head_fraction: self.summarizer.head_fraction,
            tail_fraction: self.summarizer.tail_fraction,
            min_useful_tokens: self.context.min_useful_tokens,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::prioritizer::Factor;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.context.strategy, "smart");
        assert!(config.scan.max_file_size_bytes > 0);
        assert!(!config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.context.weights.insert("recent".into(), 75.0);
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.context.model, config.context.model);
        assert_eq!(parsed.context.weights.get("recent"), Some(&75.0));
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_usage_fraction() {
        let mut config = Config::default();
        config.context.usage_fraction = 0.0;
        assert!(config.validate().is_err());

        config.context.usage_fraction = 1.5;
        assert!(config.validate().is_err());

        config.context.usage_fraction = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_overview_fraction() {
        let mut config = Config::default();
        config.context.overview_fraction = 1.0;
        assert!(config.validate().is_err());

        config.context.overview_fraction = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_unknown_weight() {
        let mut config = Config::default();
        config.context.weights.insert("popularity".into(), 5.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_max_file_size() {
        let mut config = Config::default();
        config.scan.max_file_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_is_not_a_config_error() {
        let mut config = Config::default();
        config.context.strategy = "bogus".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dependency_dirs_constant() {
        assert!(DEPENDENCY_DIRS.contains(&"node_modules"));
        assert!(DEPENDENCY_DIRS.contains(&"target"));
        assert!(DEPENDENCY_DIRS.contains(&".venv"));
        assert!(DEPENDENCY_DIRS.contains(&"vendor"));
    }

    #[test]
    fn test_toml_partial_config() {
        let toml_str = r#"
[context]
model = "llama3:8b"

[context.weights]
mentioned = 150.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.context.model, "llama3:8b");
        assert_eq!(config.context.usage_fraction, 0.8);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.weight_table().unwrap().get(Factor::Mentioned), 150.0);
        assert_eq!(config.weight_table().unwrap().get(Factor::Recent), 50.0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.context.strategy = "whole_repo".into();
        config.cache.ttl_secs = 60;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.context.strategy, "whole_repo");
        assert_eq!(loaded.cache_ttl(), Duration::from_secs(60));
        assert_eq!(loaded.cache.max_entries, 10_000);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.context.min_useful_tokens, 100);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[context]\nusage_fraction = 2.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_summarizer_config_carries_floor() {
        let mut config = Config::default();
        config.context.min_useful_tokens = 42;
        let summarizer = config.summarizer_config();
        assert_eq!(summarizer.min_useful_tokens, 42);
        assert_eq!(summarizer.head_fraction, 0.6);
    }
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use anyhow::Result;

use crate::config::Config;
use crate::context::prioritizer::Factor;
use crate::context::strategy::Strategy;

pub async fn show() -> Result<()> {
    let config = Config::load()?;
    let content = toml::to_string_pretty(&config)?;
    println!("# {}", Config::config_path().display());
    println!("{}", content);
    Ok(())
}

/// apply one dotted `key = value` assignment
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    if let Some(name) = key.strip_prefix("context.weights.") {
        let factor: Factor = name.parse()?;
        config
            .context
            .weights
            .insert(factor.as_str().to_string(), value.parse()?);
        return Ok(());
    }

    match key {
        "context.model" => {
            config.context.model = value.to_string();
        }
        "context.strategy" => {
            let strategy: Strategy = value.parse()?;
            config.context.strategy = strategy.as_str().to_string();
        }
        "context.usage_fraction" => {
            config.context.usage_fraction = value.parse()?;
        }
        "context.overview_fraction" => {
            config.context.overview_fraction = value.parse()?;
        }
        "context.min_useful_tokens" => {
            config.context.min_useful_tokens = value.parse()?;
        }
        "summarizer.head_fraction" => {
            config.summarizer.head_fraction = value.parse()?;
        }
        "summarizer.tail_fraction" => {
            config.summarizer.tail_fraction = value.parse()?;
        }
        "cache.ttl_secs" => {
            config.cache.ttl_secs = value.parse()?;
        }
        "cache.max_entries" => {
            config.cache.max_entries = value.parse()?;
        }
        "scan.max_file_size_bytes" => {
            config.scan.max_file_size_bytes = value.parse()?;
        }
        "scan.include_dependencies" => {
            config.scan.include_dependencies = value.parse()?;
        }
        "ignore_patterns" => {
            config.ignore_patterns = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }
    Ok(())
}

pub async fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    apply(&mut config, key, value)?;
    config.validate()?;
    config.save()?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub async fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_scalar_keys() {
        let mut config = Config::default();
        apply(&mut config, "context.model", "llama3.1:8b").unwrap();
        apply(&mut config, "context.usage_fraction", "0.6").unwrap();
        apply(&mut config, "cache.ttl_secs", "30").unwrap();
        apply(&mut config, "cache.max_entries", "500").unwrap();
        apply(&mut config, "scan.include_dependencies", "true").unwrap();

        assert_eq!(config.context.model, "llama3.1:8b");
        assert_eq!(config.context.usage_fraction, 0.6);
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.max_entries, 500);
        assert!(config.scan.include_dependencies);
    }

    #[test]
    fn test_apply_strategy_normalised() {
        let mut config = Config::default();
        apply(&mut config, "context.strategy", "Whole-Repo").unwrap();
        assert_eq!(config.context.strategy, "whole_repo");
        assert!(apply(&mut config, "context.strategy", "bogus").is_err());
    }

    #[test]
    fn test_apply_weight() {
        let mut config = Config::default();
        apply(&mut config, "context.weights.recent", "80").unwrap();
        assert_eq!(config.context.weights.get("recent"), Some(&80.0));
        assert!(apply(&mut config, "context.weights.stars", "1").is_err());
        assert!(apply(&mut config, "context.weights.recent", "lots").is_err());
    }

    #[test]
    fn test_apply_ignore_patterns() {
        let mut config = Config::default();
        apply(&mut config, "ignore_patterns", "*.snap, fixtures/ ,").unwrap();
        assert_eq!(config.ignore_patterns, vec!["*.snap", "fixtures/"]);
    }

    #[test]
    fn test_apply_unknown_key() {
        let mut config = Config::default();
        assert!(apply(&mut config, "query.top_k", "5").is_err());
    }

    #[test]
    fn test_out_of_range_caught_by_validate() {
        let mut config = Config::default();
        apply(&mut config, "context.usage_fraction", "1.5").unwrap();
        assert!(config.validate().is_err());
    }
}

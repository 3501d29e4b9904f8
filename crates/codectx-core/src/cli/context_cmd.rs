// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{BuildOutcome, BuildRequest, BuildState, ContextBuilder, FileContentCache};
use crate::discovery::scan_project;
use crate::prompt::build_prompt;

pub struct ContextArgs {
    pub query: String,
    pub path: String,
    pub model: Option<String>,
    pub strategy: Option<String>,
    pub usage_fraction: Option<f64>,
    pub mentions: Vec<String>,
    pub recent: Vec<String>,
    pub json: bool,
    pub prompt: bool,
}

fn request_from(args: &ContextArgs, config: &Config) -> BuildRequest {
    BuildRequest {
        query: args.query.clone(),
        model: args
            .model
            .clone()
            .unwrap_or_else(|| config.context.model.clone()),
        strategy: args
            .strategy
            .clone()
            .unwrap_or_else(|| config.context.strategy.clone()),
        usage_fraction: args
            .usage_fraction
            .unwrap_or(config.context.usage_fraction),
        mentioned_paths: args.mentions.clone(),
        recent_paths: args.recent.clone(),
    }
}

pub fn builder_from(config: &Config) -> Result<ContextBuilder> {
    Ok(
        ContextBuilder::new(Arc::new(FileContentCache::with_capacity(
            config.cache_ttl(),
            config.cache.max_entries,
        )))
            .with_weights(config.weight_table()?)
            .with_summarizer(config.summarizer_config())
            .with_overview_fraction(config.context.overview_fraction),
    )
}

pub async fn run(args: ContextArgs) -> Result<()> {
    let config = Config::load()?;
    let request = request_from(&args, &config);
    let builder = builder_from(&config)?;
    let root = PathBuf::from(&args.path);

    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let mut handle = tokio::task::spawn_blocking(move || -> Result<BuildOutcome> {
        let snapshot = scan_project(&root, &config)
            .with_context(|| format!("failed to scan {}", root.display()))?;
        let outcome = builder.build_with_cancel(&snapshot, &request, &task_cancel)?;
        Ok(outcome)
    });

    let joined = tokio::select! {
        res = &mut handle => res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("cancelling context build...");
            cancel.cancel();
            handle.await
        }
    };
    let outcome = joined.context("context build task failed")??;

    if args.json {
        let mut value = serde_json::to_value(&outcome)?;
        if args.prompt {
            value["prompt"] = build_prompt(&args.query, &outcome.payload).into();
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    if args.prompt {
        println!("{}", build_prompt(&args.query, &outcome.payload));
    } else {
        print!("{}", outcome.payload.text);
    }

    let payload = &outcome.payload;
    eprintln!();
    eprintln!(
        "{} | {} ({} tokens) | strategy {}",
        payload.usage_summary(),
        outcome.model.identifier,
        outcome.model.context_window_tokens,
        outcome.strategy
    );
    eprintln!(
        "files: {} full, {} summarized, {} excluded",
        payload.included_files.len(),
        payload.summarized_files.len(),
        payload.excluded_files.len()
    );
    if outcome.state == BuildState::Degraded {
        eprintln!("note: degraded build, only part of the project context is included");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ContextArgs {
        ContextArgs {
            query: "where is the cache".into(),
            path: ".".into(),
            model: None,
            strategy: None,
            usage_fraction: None,
            mentions: vec!["src/cache.rs".into()],
            recent: Vec::new(),
            json: false,
            prompt: false,
        }
    }

    #[test]
    fn test_request_falls_back_to_config() {
        let mut config = Config::default();
        config.context.model = "llama3:8b".into();
        config.context.strategy = "whole_repo".into();
        config.context.usage_fraction = 0.5;

        let request = request_from(&args(), &config);
        assert_eq!(request.model, "llama3:8b");
        assert_eq!(request.strategy, "whole_repo");
        assert_eq!(request.usage_fraction, 0.5);
        assert_eq!(request.mentioned_paths, vec!["src/cache.rs"]);
    }

    #[test]
    fn test_request_flags_override_config() {
        let mut a = args();
        a.model = Some("gpt-4".into());
        a.strategy = Some("minimal".into());
        a.usage_fraction = Some(0.9);

        let request = request_from(&a, &Config::default());
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.strategy, "minimal");
        assert_eq!(request.usage_fraction, 0.9);
    }

    #[test]
    fn test_builder_from_config_rejects_bad_weights() {
        let mut config = Config::default();
        config.context.weights.insert("nope".into(), 1.0);
        assert!(builder_from(&config).is_err());
        assert!(builder_from(&Config::default()).is_ok());
    }
}

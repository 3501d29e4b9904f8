// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use anyhow::Result;

use crate::config::Config;
use crate::context::budget::Budget;
use crate::context::models::{self, DEFAULT_CONTEXT_WINDOW};

pub async fn show(identifier: &str, usage_fraction: Option<f64>) -> Result<()> {
    let config = Config::load()?;
    let fraction = usage_fraction.unwrap_or(config.context.usage_fraction);
    let found = models::lookup(identifier);
    let budget = Budget::resolve(found.profile.context_window_tokens, fraction)?;

    println!("model:    {}", found.profile.identifier);
    println!("window:   {} tokens", found.profile.context_window_tokens);
    if found.unknown {
        println!(
            "          (not recognised, assuming the {}-token default)",
            DEFAULT_CONTEXT_WINDOW
        );
    }
    println!(
        "budget:   {} tokens at {:.0}%",
        budget.usable_tokens,
        budget.usage_fraction * 100.0
    );
    println!(
        "overview: up to {} tokens",
        budget.reserve(config.context.overview_fraction)
    );
    Ok(())
}

pub async fn list() -> Result<()> {
    println!("{:<24} {:>10}", "pattern", "window");
    for (pattern, window) in models::known_models() {
        println!("{:<24} {:>10}", pattern, window);
    }
    println!();
    println!(
        "patterns match case-insensitively at the start of an identifier segment \
         (after / : . - _), first match wins. \
         anything else gets {} tokens.",
        DEFAULT_CONTEXT_WINDOW
    );
    Ok(())
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::context::prioritizer::{query_keywords, Prioritizer};
use crate::discovery::scan_project;

pub async fn run(
    path: &str,
    query: Option<&str>,
    mentions: &[String],
    recent: &[String],
    explain: bool,
) -> Result<()> {
    let config = Config::load()?;
    let snapshot = scan_project(Path::new(path), &config)
        .with_context(|| format!("failed to scan {}", path))?;

    println!(
        "{}: {} candidate files ({})",
        snapshot.name,
        snapshot.files.len(),
        snapshot.root.display()
    );

    let ranked = query.is_some() || !mentions.is_empty() || !recent.is_empty();
    if !ranked {
        for file in &snapshot.files {
            println!(
                "  {:<10} {:>9}  {}",
                file.language.as_str(),
                file.size_bytes,
                file.relative_path
            );
        }
        return Ok(());
    }

    let query = query.unwrap_or("");
    let prioritizer = Prioritizer::new(config.weight_table()?, SystemTime::now());
    let keywords = query_keywords(query);
    let files = prioritizer.rank(snapshot.files, query, mentions, recent);

    for file in &files {
        let mut flags = String::new();
        if file.is_mentioned {
            flags.push('M');
        }
        if file.is_recent {
            flags.push('R');
        }
        println!(
            "  {:>7.2} {:<2} {}",
            file.priority_score, flags, file.relative_path
        );
        if explain {
            let parts: Vec<String> = prioritizer
                .breakdown(file, &keywords)
                .into_iter()
                .filter(|(_, points)| *points > 0.0)
                .map(|(factor, points)| format!("{} {:.1}", factor.as_str(), points))
                .collect();
            println!("           {}", parts.join(", "));
        }
    }
    Ok(())
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::collections::{BTreeMap, BTreeSet};

use codectx_common::types::Language;

use super::tokens::tokens_to_chars;
use crate::discovery::ProjectSnapshot;

/// languages listed in the header before the rest are dropped
const MAX_LANGUAGES: usize = 6;

/// render the project overview block within `token_limit` estimated tokens.
///
/// the header (name, root, size, languages, top-level layout) comes first,
/// then the file tree when `include_tree` is set. lines are dropped from the
/// end once the limit is reached, with a `... (N more)` line standing in for
/// skipped tree entries. the first line is always kept, cut short if needed,
/// so the block is never empty for a non-zero limit.
pub fn render_overview(
    snapshot: &ProjectSnapshot,
    include_tree: bool,
    token_limit: usize,
) -> String {
    let max_chars = tokens_to_chars(token_limit);
    let header = header_lines(snapshot);
    let tree: Vec<String> = if include_tree {
        snapshot
            .files
            .iter()
            .map(|f| format!("  {}", f.relative_path))
            .collect()
    } else {
        Vec::new()
    };

    let mut out = String::new();
    let mut used = 0;

    for line in &header {
        let cost = line.chars().count() + 1;
        if used + cost > max_chars {
            if out.is_empty() {
                out.extend(line.chars().take(max_chars));
            }
            return out;
        }
        out.push_str(line);
        out.push('\n');
        used += cost;
    }

    if tree.is_empty() {
        return out;
    }

    let title = "files:";
    if used + title.len() + 1 > max_chars {
        return out;
    }
    out.push_str(title);
    out.push('\n');
    used += title.len() + 1;

    let mut listed = 0;
    for line in &tree {
        let remaining_after = tree.len() - listed - 1;
        let footer_cost = if remaining_after > 0 {
            more_line(remaining_after).len() + 1
        } else {
            0
        };
        let cost = line.chars().count() + 1;
        if used + cost + footer_cost > max_chars {
            break;
        }
        out.push_str(line);
        out.push('\n');
        used += cost;
        listed += 1;
    }

    let skipped = tree.len() - listed;
    if skipped > 0 {
        let footer = more_line(skipped);
        if used + footer.len() + 1 <= max_chars {
            out.push_str(&footer);
            out.push('\n');
        }
    }
    out
}

fn more_line(count: usize) -> String {
    format!("  ... ({} more)", count)
}

fn header_lines(snapshot: &ProjectSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("# project: {}", snapshot.name),
        format!("root: {}", snapshot.root.display()),
        format!(
            "files: {} ({})",
            snapshot.files.len(),
            format_bytes(snapshot.total_bytes())
        ),
    ];

    let mut languages: BTreeMap<&str, usize> = BTreeMap::new();
    for file in &snapshot.files {
        if file.language != Language::Unknown {
            *languages.entry(file.language.as_str()).or_default() += 1;
        }
    }
    if !languages.is_empty() {
        let mut counts: Vec<_> = languages.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        let listed: Vec<String> = counts
            .iter()
            .take(MAX_LANGUAGES)
            .map(|(lang, n)| format!("{} {}", lang, n))
            .collect();
        lines.push(format!("languages: {}", listed.join(", ")));
    }

    let layout = top_level_layout(snapshot);
    if !layout.is_empty() {
        lines.push(format!("layout: {}", layout.join(" ")));
    }
    lines
}

/// first path component of every file, directories suffixed with `/`
fn top_level_layout(snapshot: &ProjectSnapshot) -> Vec<String> {
    let mut dirs = BTreeSet::new();
    let mut files = BTreeSet::new();
    for file in &snapshot.files {
        match file.relative_path.split_once('/') {
            Some((dir, _)) => {
                dirs.insert(format!("{}/", dir));
            }
            None => {
                files.insert(file.relative_path.clone());
            }
        }
    }
    dirs.into_iter().chain(files).collect()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tokens::estimate_tokens;
    use codectx_common::types::CandidateFile;
    use std::time::SystemTime;

    fn snapshot(paths: &[&str]) -> ProjectSnapshot {
        let files = paths
            .iter()
            .map(|p| {
                CandidateFile::new(
                    format!("/work/demo/{}", p),
                    *p,
                    2048,
                    SystemTime::UNIX_EPOCH,
                )
            })
            .collect();
        ProjectSnapshot::new("/work/demo", files)
    }

    #[test]
    fn test_header_contents() {
        let snap = snapshot(&["Cargo.toml", "src/main.rs", "src/lib.rs", "docs/guide.md"]);
        let text = render_overview(&snap, false, 1_000);
        assert!(text.starts_with("# project: demo\n"));
        assert!(text.contains("root: /work/demo"));
        assert!(text.contains("files: 4 (8.0 KB)"));
        assert!(text.contains("languages: rust 2, markdown 1, toml 1"));
        assert!(text.contains("layout: docs/ src/ Cargo.toml"));
        assert!(!text.contains("files:\n"));
    }

    #[test]
    fn test_tree_listing() {
        let snap = snapshot(&["a.rs", "b/c.rs"]);
        let text = render_overview(&snap, true, 1_000);
        assert!(text.contains("files:\n  a.rs\n  b/c.rs\n"));
        assert!(!text.contains("more)"));
    }

    #[test]
    fn test_tree_truncated_with_footer() {
        let paths: Vec<String> = (0..500).map(|i| format!("src/module_{:03}.rs", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let snap = snapshot(&refs);

        let text = render_overview(&snap, true, 200);
        assert!(estimate_tokens(&text) <= 200);
        assert!(text.contains("  src/module_000.rs\n"));
        assert!(text.contains("more)"));
        assert!(!text.contains("module_499"));
    }

    #[test]
    fn test_never_exceeds_limit() {
        let snap = snapshot(&["Cargo.toml", "src/main.rs", "src/cache.rs", "README.md"]);
        for limit in [1, 2, 5, 10, 20, 40, 80] {
            let text = render_overview(&snap, true, limit);
            assert!(estimate_tokens(&text) <= limit, "limit {limit}");
            assert!(!text.is_empty(), "limit {limit}");
        }
    }

    #[test]
    fn test_tiny_limit_keeps_name_prefix() {
        let snap = snapshot(&["main.rs"]);
        let text = render_overview(&snap, true, 2);
        assert_eq!(text, "# projec");
    }

    #[test]
    fn test_empty_project() {
        let snap = snapshot(&[]);
        let text = render_overview(&snap, true, 100);
        assert!(text.contains("files: 0 (0 B)"));
        assert!(!text.contains("layout:"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}

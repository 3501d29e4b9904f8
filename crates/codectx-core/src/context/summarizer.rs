// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use super::tokens::{estimate_tokens, tokens_to_chars};

/// below this many tokens a file is dropped instead of summarized
pub const DEFAULT_MIN_USEFUL_TOKENS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummarizerConfig {
    /// share of the limit kept from the start of the file
    pub head_fraction: f64,
    /// share of the limit kept from the end of the file
    pub tail_fraction: f64,
    pub min_useful_tokens: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            head_fraction: 0.6,
            tail_fraction: 0.2,
            min_useful_tokens: DEFAULT_MIN_USEFUL_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// the content already fits
    Unchanged(String),
    /// head and tail kept, middle replaced by an omission marker
    Truncated { text: String, omitted_lines: usize },
    /// the allotment is too small to be worth a fragment
    Excluded,
}

impl SummaryOutcome {
    pub fn omitted_lines(&self) -> usize {
        match self {
            SummaryOutcome::Truncated { omitted_lines, .. } => *omitted_lines,
            _ => 0,
        }
    }
}

pub fn omission_marker(omitted_lines: usize) -> String {
    format!("... [{} lines omitted] ...", omitted_lines)
}

/// shrink `content` to at most `token_limit` estimated tokens by keeping its
/// head and tail lines.
pub fn summarize(content: &str, token_limit: usize, config: &SummarizerConfig) -> SummaryOutcome {
    if estimate_tokens(content) <= token_limit {
        return SummaryOutcome::Unchanged(content.to_string());
    }
    if token_limit < config.min_useful_tokens {
        return SummaryOutcome::Excluded;
    }

    let lines: Vec<&str> = content.lines().collect();
    let head_chars = tokens_to_chars(fraction_of(token_limit, config.head_fraction));
    let tail_chars = tokens_to_chars(fraction_of(token_limit, config.tail_fraction));

    let mut head_end = 0;
    let mut used = 0;
    for line in &lines {
        let cost = line.chars().count() + 1;
        if used + cost > head_chars {
            break;
        }
        used += cost;
        head_end += 1;
    }

    let mut tail_start = lines.len();
    let mut used = 0;
    while tail_start > head_end {
        let cost = lines[tail_start - 1].chars().count() + 1;
        if used + cost > tail_chars {
            break;
        }
        used += cost;
        tail_start -= 1;
    }

    // a first line longer than the whole head budget still gets a prefix
    let partial_head = if head_end == 0 && !lines.is_empty() {
        Some(take_chars(lines[0], head_chars.saturating_sub(1)))
    } else {
        None
    };
    let kept_head = if partial_head.is_some() { 1 } else { head_end };
    let omitted_lines = tail_start.saturating_sub(kept_head);

    let mut text = String::new();
    match partial_head {
        Some(prefix) => {
            text.push_str(prefix);
            text.push('\n');
        }
        None => {
            for line in &lines[..head_end] {
                text.push_str(line);
                text.push('\n');
            }
        }
    }
    text.push_str(&omission_marker(omitted_lines));
    for line in &lines[tail_start.max(kept_head)..] {
        text.push('\n');
        text.push_str(line);
    }

    // the marker normally fits in the slack; enforce the ceiling regardless
    if estimate_tokens(&text) > token_limit {
        text = take_chars(&text, tokens_to_chars(token_limit)).to_string();
    }

    SummaryOutcome::Truncated {
        text,
        omitted_lines,
    }
}

fn fraction_of(tokens: usize, fraction: f64) -> usize {
    (tokens as f64 * fraction.clamp(0.0, 1.0)).floor() as usize
}

fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize, width: usize) -> String {
        (0..count)
            .map(|i| format!("{:0width$}", i, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_fits_is_unchanged() {
        let content = "fn main() {\n    println!(\"hi\");\n}\n";
        let outcome = summarize(content, 1_000, &SummarizerConfig::default());
        assert_eq!(outcome, SummaryOutcome::Unchanged(content.to_string()));
        assert_eq!(outcome.omitted_lines(), 0);
    }

    #[test]
    fn test_fits_even_below_floor() {
        // a tiny file is returned whole even when its allotment is tiny
        let outcome = summarize("abc", 1, &SummarizerConfig::default());
        assert_eq!(outcome, SummaryOutcome::Unchanged("abc".into()));
    }

    #[test]
    fn test_below_floor_is_excluded() {
        let content = numbered_lines(500, 10);
        let outcome = summarize(&content, 99, &SummarizerConfig::default());
        assert_eq!(outcome, SummaryOutcome::Excluded);
    }

    #[test]
    fn test_head_and_tail_kept() {
        let content = numbered_lines(1_000, 10);
        let outcome = summarize(&content, 200, &SummarizerConfig::default());

        let SummaryOutcome::Truncated {
            text,
            omitted_lines,
        } = outcome
        else {
            panic!("expected truncation");
        };
        assert!(text.starts_with("0000000000\n"));
        assert!(text.ends_with("0000000999"));
        assert!(text.contains(&omission_marker(omitted_lines)));

        // 11 chars per line: 480 head chars -> 43 lines, 160 tail chars -> 14 lines
        assert_eq!(omitted_lines, 1_000 - 43 - 14);
        assert!(estimate_tokens(&text) <= 200);
    }

    #[test]
    fn test_never_exceeds_limit() {
        let config = SummarizerConfig::default();
        for (count, width) in [(50, 3), (300, 40), (2_000, 7), (10, 900)] {
            let content = numbered_lines(count, width);
            for limit in [100, 101, 150, 333, 1_000] {
                match summarize(&content, limit, &config) {
                    SummaryOutcome::Unchanged(text) => assert_eq!(text, content),
                    SummaryOutcome::Truncated { text, .. } => {
                        assert!(estimate_tokens(&text) <= limit, "limit {limit}")
                    }
                    SummaryOutcome::Excluded => panic!("limit {limit} is above the floor"),
                }
            }
        }
    }

    #[test]
    fn test_single_huge_line_keeps_prefix() {
        let content = "x".repeat(10_000);
        let outcome = summarize(&content, 100, &SummarizerConfig::default());
        let SummaryOutcome::Truncated {
            text,
            omitted_lines,
        } = outcome
        else {
            panic!("expected truncation");
        };
        assert_eq!(omitted_lines, 0);
        assert!(text.starts_with("xxxx"));
        assert!(estimate_tokens(&text) <= 100);
    }

    #[test]
    fn test_configurable_fractions() {
        let content = numbered_lines(1_000, 10);
        let config = SummarizerConfig {
            head_fraction: 0.2,
            tail_fraction: 0.6,
            min_useful_tokens: 10,
        };
        let SummaryOutcome::Truncated { text, .. } = summarize(&content, 200, &config) else {
            panic!("expected truncation");
        };
        let marker_at = text.find("... [").unwrap();
        // more of the kept text sits after the marker than before it
        assert!(text.len() - marker_at > marker_at * 2);
    }

    #[test]
    fn test_multibyte_content() {
        let content = "é".repeat(60) + &"\nλλλλ".repeat(500);
        let outcome = summarize(&content, 120, &SummarizerConfig::default());
        match outcome {
            SummaryOutcome::Truncated { text, .. } => assert!(estimate_tokens(&text) <= 120),
            other => panic!("unexpected {other:?}"),
        }
    }
}

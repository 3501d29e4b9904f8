// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use serde::Serialize;

/// window assumed for models the table does not recognise
pub const DEFAULT_CONTEXT_WINDOW: usize = 4096;

/// context window for a model family, resolved once per query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProfile {
    pub identifier: String,
    pub context_window_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLookup {
    pub profile: ModelProfile,
    /// no pattern matched and the default window was used
    pub unknown: bool,
}

/// (pattern, window) pairs. first match wins, so size variants and newer
/// generations must sit above the family name they contain. a pattern only
/// matches at the start of a name segment, see `SEGMENT_SEPARATORS`.
const MODEL_WINDOWS: &[(&str, usize)] = &[
    // openai
    ("gpt-4.1", 1_047_576),
    ("chatgpt-4o", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4-1106", 128_000),
    ("gpt-4-32k", 32_768),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo-16k", 16_385),
    ("gpt-3.5-turbo", 4_096),
    ("o1-", 200_000),
    // anthropic
    ("claude-3", 200_000),
    ("claude-2", 100_000),
    ("claude", 100_000),
    // google
    ("gemini-1.5-pro", 2_097_152),
    ("gemini-1.5", 1_048_576),
    ("gemini-2", 1_048_576),
    ("gemini", 32_768),
    ("codegemma", 8_192),
    ("gemma2", 8_192),
    ("gemma", 8_192),
    // meta
    ("codellama", 16_384),
    ("tinyllama", 2_048),
    ("llama3.2", 131_072),
    ("llama-3.2", 131_072),
    ("llama3.1", 131_072),
    ("llama-3.1", 131_072),
    ("llama3", 8_192),
    ("llama-3", 8_192),
    ("llama2", 4_096),
    ("llama-2", 4_096),
    ("llama", 2_048),
    // mistral
    ("mistral-large", 128_000),
    ("mistral-nemo", 128_000),
    ("mixtral", 32_768),
    ("codestral", 32_768),
    ("mistral", 32_768),
    // others commonly served locally
    ("codeqwen", 65_536),
    ("qwen2.5-coder", 32_768),
    ("qwen2.5", 32_768),
    ("qwen", 8_192),
    ("deepseek-coder-v2", 163_840),
    ("deepseek-coder", 16_384),
    ("deepseek", 65_536),
    ("phi3", 4_096),
    ("phi-3", 4_096),
    ("phi", 2_048),
    ("starcoder2", 16_384),
    ("starcoder", 8_192),
    ("command-r", 128_000),
    ("yi", 4_096),
];

/// characters that start a new segment of a model identifier, as in
/// `ollama/llama3.1:8b` or `anthropic.claude-3-haiku`
const SEGMENT_SEPARATORS: &[char] = &['/', ':', '.', '-', '_', ' '];

/// true when `pattern` occurs in `needle` at the start of a name segment
fn matches_segment(needle: &str, pattern: &str) -> bool {
    needle.match_indices(pattern).any(|(at, _)| {
        needle[..at]
            .chars()
            .next_back()
            .map_or(true, |c| SEGMENT_SEPARATORS.contains(&c))
    })
}

/// resolve a model identifier to its context window.
///
/// matching is case-insensitive and anchored to segment starts, in table
/// order. never
/// fails: an unrecognised identifier gets `DEFAULT_CONTEXT_WINDOW` and
/// `unknown = true` so the caller can warn about it.
pub fn lookup(identifier: &str) -> ModelLookup {
    let needle = identifier.trim().to_lowercase();
    let matched = if needle.is_empty() {
        None
    } else {
        MODEL_WINDOWS
            .iter()
            .find(|(pattern, _)| matches_segment(&needle, pattern))
    };

    match matched {
        Some(&(_, window)) => ModelLookup {
            profile: ModelProfile {
                identifier: needle,
                context_window_tokens: window,
            },
            unknown: false,
        },
        None => ModelLookup {
            profile: ModelProfile {
                identifier: needle,
                context_window_tokens: DEFAULT_CONTEXT_WINDOW,
            },
            unknown: true,
        },
    }
}

/// the table in match order, for listing
pub fn known_models() -> impl Iterator<Item = (&'static str, usize)> {
    MODEL_WINDOWS.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("GPT-4-Turbo"), lookup("gpt-4-turbo"));
        assert_eq!(lookup("gpt-4-turbo").profile.context_window_tokens, 128_000);
    }

    #[test]
    fn test_specific_before_generic() {
        assert_eq!(lookup("gpt-3.5-turbo").profile.context_window_tokens, 4_096);
        assert_eq!(
            lookup("gpt-3.5-turbo-16k").profile.context_window_tokens,
            16_385
        );
        assert_eq!(lookup("gpt-4").profile.context_window_tokens, 8_192);
        assert_eq!(lookup("gpt-4-32k-0613").profile.context_window_tokens, 32_768);
        assert_eq!(lookup("codellama:13b").profile.context_window_tokens, 16_384);
        assert_eq!(lookup("llama3.1:8b").profile.context_window_tokens, 131_072);
        assert_eq!(lookup("llama3:8b").profile.context_window_tokens, 8_192);
    }

    #[test]
    fn test_ollama_style_tags() {
        let found = lookup("qwen2.5-coder:7b-instruct-q4_K_M");
        assert!(!found.unknown);
        assert_eq!(found.profile.context_window_tokens, 32_768);
    }

    #[test]
    fn test_range_spans_small_to_million() {
        assert_eq!(lookup("llama-7b").profile.context_window_tokens, 2_048);
        assert!(lookup("gemini-1.5-flash").profile.context_window_tokens >= 1_000_000);
    }

    #[test]
    fn test_unknown_model_defaults() {
        let found = lookup("my-finetune-v3");
        assert!(found.unknown);
        assert_eq!(found.profile.context_window_tokens, DEFAULT_CONTEXT_WINDOW);

        let empty = lookup("   ");
        assert!(empty.unknown);
        assert_eq!(empty.profile.context_window_tokens, 4096);
    }

    #[test]
    fn test_short_patterns_need_a_segment_start() {
        let dolphin = lookup("dolphin3");
        assert!(dolphin.unknown);
        assert_eq!(dolphin.profile.context_window_tokens, DEFAULT_CONTEXT_WINDOW);
        assert!(lookup("mistyiris").unknown);

        assert_eq!(lookup("phi3:mini").profile.context_window_tokens, 4_096);
        assert_eq!(lookup("microsoft/phi-2").profile.context_window_tokens, 2_048);
        assert!(!lookup("yi:34b").unknown);
        assert!(!lookup("dolphin-mistral:7b").unknown);
    }

    #[test]
    fn test_segment_prefixes_match() {
        assert_eq!(
            lookup("meta-llama/Llama-3.1-8B-Instruct").profile.context_window_tokens,
            131_072
        );
        assert_eq!(
            lookup("anthropic.claude-3-haiku").profile.context_window_tokens,
            200_000
        );
        assert_eq!(lookup("chatgpt-4o-latest").profile.context_window_tokens, 128_000);
        assert_eq!(lookup("tinyllama").profile.context_window_tokens, 2_048);
    }

    #[test]
    fn test_lookup_deterministic() {
        for id in ["mixtral-8x7b", "unknown-thing", "claude-3-opus"] {
            assert_eq!(lookup(id), lookup(id));
        }
    }

    #[test]
    fn test_table_size_and_patterns_lowercase() {
        let models: Vec<_> = known_models().collect();
        assert!(models.len() >= 15);
        for (pattern, window) in models {
            assert_eq!(pattern, pattern.to_lowercase());
            assert!(window >= 2_048);
        }
    }

    #[test]
    fn test_no_pattern_shadowed_by_earlier_entry() {
        // a pattern containing an earlier pattern can never match
        let models: Vec<_> = known_models().collect();
        for (i, (later, _)) in models.iter().enumerate() {
            for (earlier, _) in &models[..i] {
                assert!(
                    !later.contains(earlier),
                    "{later} is shadowed by {earlier}"
                );
            }
        }
    }
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use codectx_common::types::{ContextPayload, SummarizedFile};

#[test]
fn test_empty_payload() {
    let payload = ContextPayload::empty(3276);
    assert!(payload.is_empty());
    assert_eq!(payload.tokens_used, 0);
    assert_eq!(payload.tokens_budget, 3276);
    assert_eq!(payload.file_count(), 0);
}

#[test]
fn test_usage_summary_matches_status_line_format() {
    let payload = ContextPayload {
        tokens_used: 142_830,
        tokens_budget: 160_000,
        ..ContextPayload::default()
    };
    assert_eq!(payload.usage_summary(), "142,830/160,000 tokens used (89%)");
}

#[test]
fn test_usage_summary_small_numbers() {
    let payload = ContextPayload {
        tokens_used: 12,
        tokens_budget: 999,
        ..ContextPayload::default()
    };
    assert_eq!(payload.usage_summary(), "12/999 tokens used (1%)");
}

#[test]
fn test_usage_percent_zero_budget() {
    let payload = ContextPayload::default();
    assert_eq!(payload.usage_percent(), 0);
    assert_eq!(payload.usage_summary(), "0/0 tokens used (0%)");
}

#[test]
fn test_file_count_includes_summarized() {
    let payload = ContextPayload {
        included_files: vec!["README.md".into()],
        summarized_files: vec![SummarizedFile {
            path: "src/big.rs".into(),
            omitted_lines: 420,
        }],
        excluded_files: vec!["src/other.rs".into()],
        ..ContextPayload::default()
    };
    assert_eq!(payload.file_count(), 2);
}

#[test]
fn test_payload_json_shape() {
    let payload = ContextPayload {
        text: "--- README.md ---\nhello\n".into(),
        tokens_used: 7,
        tokens_budget: 100,
        included_files: vec!["README.md".into()],
        summarized_files: vec![],
        excluded_files: vec![],
    };
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["tokens_used"], 7);
    assert_eq!(value["included_files"][0], "README.md");
    assert!(value["summarized_files"].as_array().unwrap().is_empty());

    // older payloads without excluded_files still parse
    let legacy = r#"{"text":"","tokens_used":0,"tokens_budget":0,"included_files":[],"summarized_files":[]}"#;
    let parsed: ContextPayload = serde_json::from_str(legacy).unwrap();
    assert!(parsed.excluded_files.is_empty());
}

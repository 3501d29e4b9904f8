// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

/// characters assumed per token when estimating
pub const CHARS_PER_TOKEN: usize = 4;

/// approximate token count for `text`: characters / 4, rounded up.
///
/// this is not any particular model's tokenizer. it is only good enough
/// to keep budgets honest, and it is monotonic in the length of the text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// number of characters that fit in `tokens` under the same ratio
pub fn tokens_to_chars(tokens: usize) -> usize {
    tokens.saturating_mul(CHARS_PER_TOKEN)
}

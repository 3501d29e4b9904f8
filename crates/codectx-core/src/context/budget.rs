// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use serde::Serialize;

use codectx_common::{Error, Result};

/// share of the window handed to context when nothing is configured. the
/// rest stays free for the model's response.
pub const DEFAULT_USAGE_FRACTION: f64 = 0.8;

/// the token ceiling for one build
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Budget {
    pub window_tokens: usize,
    pub usage_fraction: f64,
    pub usable_tokens: usize,
}

impl Budget {
    /// `usable_tokens = floor(window_tokens * usage_fraction)`.
    ///
    /// errors when the fraction is outside (0, 1] or the result leaves no
    /// usable tokens at all.
    pub fn resolve(window_tokens: usize, usage_fraction: f64) -> Result<Self> {
        if !usage_fraction.is_finite() || usage_fraction <= 0.0 || usage_fraction > 1.0 {
            return Err(Error::Budget(format!(
                "usage fraction must be within (0, 1], got {}",
                usage_fraction
            )));
        }
        if window_tokens == 0 {
            return Err(Error::Budget("model context window is zero".into()));
        }

        let mut usable_tokens = (window_tokens as f64 * usage_fraction).floor() as usize;
        // float rounding can land on the full window for fractions just below 1
        if usage_fraction < 1.0 && usable_tokens >= window_tokens {
            usable_tokens = window_tokens - 1;
        }
        if usable_tokens == 0 {
            return Err(Error::Budget(format!(
                "no usable tokens: window {} at fraction {}",
                window_tokens, usage_fraction
            )));
        }

        Ok(Self {
            window_tokens,
            usage_fraction,
            usable_tokens,
        })
    }

    /// tokens set aside for the project overview block
    pub fn reserve(&self, fraction: f64) -> usize {
        let fraction = fraction.clamp(0.0, 1.0);
        (self.usable_tokens as f64 * fraction).floor() as usize
    }
}

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

pub mod budget;
pub mod builder;
pub mod cache;
pub mod models;
pub mod overview;
pub mod prioritizer;
pub mod strategy;
pub mod summarizer;
pub mod tokens;

pub use budget::Budget;
pub use builder::{
    BuildEvent, BuildObserver, BuildOutcome, BuildRequest, BuildState, BuildWarning,
    ContextBuilder,
};
pub use cache::FileContentCache;
pub use strategy::Strategy;

// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use codectx_common::types::{CandidateFile, ContextPayload, SummarizedFile};
use codectx_common::{Error, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::budget::{Budget, DEFAULT_USAGE_FRACTION};
use super::cache::FileContentCache;
use super::models::{self, ModelProfile};
use super::overview::render_overview;
use super::prioritizer::{Prioritizer, WeightTable};
use super::strategy::Strategy;
use super::summarizer::{summarize, SummarizerConfig, SummaryOutcome};
use super::tokens::estimate_tokens;
use crate::discovery::ProjectSnapshot;

/// share of the usable budget set aside for the overview block
pub const DEFAULT_OVERVIEW_FRACTION: f64 = 0.1;

/// blank line closing every file entry
const ENTRY_TRAILER: &str = "\n\n";

/// everything the chat loop knows about the query being answered
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub query: String,
    pub model: String,
    /// strategy name as typed; unknown names fall back to smart
    pub strategy: String,
    pub usage_fraction: f64,
    pub mentioned_paths: Vec<String>,
    pub recent_paths: Vec<String>,
}

impl BuildRequest {
    pub fn new(query: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: model.into(),
            strategy: Strategy::Smart.as_str().to_string(),
            usage_fraction: DEFAULT_USAGE_FRACTION,
            mentioned_paths: Vec::new(),
            recent_paths: Vec::new(),
        }
    }

    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = name.into();
        self
    }

    pub fn usage_fraction(mut self, fraction: f64) -> Self {
        self.usage_fraction = fraction;
        self
    }

    pub fn mention(mut self, path: impl Into<String>) -> Self {
        self.mentioned_paths.push(path.into());
        self
    }

    pub fn recent(mut self, path: impl Into<String>) -> Self {
        self.recent_paths.push(path.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Idle,
    BudgetResolved,
    Prioritizing,
    Accumulating,
    Done,
    /// usable but reduced output: overview only, or a cancelled partial build
    Degraded,
    Failed,
}

/// recoverable conditions met during a build. never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildWarning {
    UnknownModel {
        identifier: String,
        assumed_window: usize,
    },
    UnknownStrategy {
        name: String,
        substituted: Strategy,
    },
    FileSkipped {
        path: String,
        reason: String,
    },
    StrategyExhausted {
        strategy: Strategy,
    },
    Cancelled {
        files_processed: usize,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::UnknownModel {
                identifier,
                assumed_window,
            } => write!(
                f,
                "unknown model '{}', assuming a {}-token context window",
                identifier, assumed_window
            ),
            BuildWarning::UnknownStrategy { name, substituted } => {
                write!(f, "unknown context strategy '{}', using {}", name, substituted)
            }
            BuildWarning::FileSkipped { path, reason } => {
                write!(f, "skipped {}: {}", path, reason)
            }
            BuildWarning::StrategyExhausted { strategy } => write!(
                f,
                "{} strategy produced no file content, falling back to the project overview",
                strategy
            ),
            BuildWarning::Cancelled { files_processed } => {
                write!(f, "build cancelled after {} files", files_processed)
            }
        }
    }
}

/// progress notifications for a status line or spinner
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    StateChanged(BuildState),
    FileIncluded {
        path: String,
        tokens: usize,
    },
    FileSummarized {
        path: String,
        tokens: usize,
        omitted_lines: usize,
    },
    FileExcluded {
        path: String,
    },
    Warning(BuildWarning),
}

pub trait BuildObserver: Send + Sync {
    fn on_event(&self, event: &BuildEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub payload: ContextPayload,
    pub state: BuildState,
    pub model: ModelProfile,
    /// absent when the strategy is off
    pub budget: Option<Budget>,
    pub strategy: Strategy,
    pub warnings: Vec<BuildWarning>,
}

/// tracks state transitions and warnings for one build
struct Run<'a> {
    observers: &'a [Arc<dyn BuildObserver>],
    state: BuildState,
    warnings: Vec<BuildWarning>,
}

impl<'a> Run<'a> {
    fn new(observers: &'a [Arc<dyn BuildObserver>]) -> Self {
        Self {
            observers,
            state: BuildState::Idle,
            warnings: Vec::new(),
        }
    }

    fn emit(&self, event: BuildEvent) {
        for observer in self.observers {
            observer.on_event(&event);
        }
    }

    fn enter(&mut self, state: BuildState) {
        tracing::debug!("context build: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.emit(BuildEvent::StateChanged(state));
    }

    fn warn(&mut self, warning: BuildWarning) {
        tracing::warn!("{}", warning);
        self.emit(BuildEvent::Warning(warning.clone()));
        self.warnings.push(warning);
    }

    fn finish(
        self,
        payload: ContextPayload,
        model: ModelProfile,
        budget: Option<Budget>,
        strategy: Strategy,
    ) -> BuildOutcome {
        tracing::debug!(
            "context build finished ({:?}, {}): {} full, {} summarized, {} excluded, {}",
            self.state,
            strategy,
            payload.included_files.len(),
            payload.summarized_files.len(),
            payload.excluded_files.len(),
            payload.usage_summary()
        );
        BuildOutcome {
            payload,
            state: self.state,
            model,
            budget,
            strategy,
            warnings: self.warnings,
        }
    }
}

/// assembles a bounded context payload for one query.
///
/// one instance lives for a chat session: the content cache is shared
/// across builds and unknown-model warnings are raised once per identifier.
pub struct ContextBuilder {
    cache: Arc<FileContentCache>,
    weights: WeightTable,
    summarizer: SummarizerConfig,
    overview_fraction: f64,
    observers: Vec<Arc<dyn BuildObserver>>,
    warned_models: Mutex<HashSet<String>>,
}

impl ContextBuilder {
    pub fn new(cache: Arc<FileContentCache>) -> Self {
        Self {
            cache,
            weights: WeightTable::default(),
            summarizer: SummarizerConfig::default(),
            overview_fraction: DEFAULT_OVERVIEW_FRACTION,
            observers: Vec::new(),
            warned_models: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_summarizer(mut self, summarizer: SummarizerConfig) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_overview_fraction(mut self, fraction: f64) -> Self {
        self.overview_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn cache(&self) -> &Arc<FileContentCache> {
        &self.cache
    }

    pub fn build(
        &self,
        snapshot: &ProjectSnapshot,
        request: &BuildRequest,
    ) -> Result<BuildOutcome> {
        self.build_with_cancel(snapshot, request, &CancellationToken::new())
    }

    /// like `build`, checking `cancel` before every file. a cancelled build
    /// returns what it had so far as `Degraded`.
    pub fn build_with_cancel(
        &self,
        snapshot: &ProjectSnapshot,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome> {
        let mut run = Run::new(&self.observers);

        let strategy = match request.strategy.parse::<Strategy>() {
            Ok(strategy) => strategy,
            Err(e) => {
                run.warn(BuildWarning::UnknownStrategy {
                    name: e.0,
                    substituted: Strategy::Smart,
                });
                Strategy::Smart
            }
        };

        let found = models::lookup(&request.model);
        let model = found.profile;

        if strategy == Strategy::Off {
            run.enter(BuildState::Done);
            return Ok(run.finish(ContextPayload::empty(0), model, None, strategy));
        }

        if found.unknown && self.warned_models.lock().insert(model.identifier.clone()) {
            run.warn(BuildWarning::UnknownModel {
                identifier: request.model.clone(),
                assumed_window: model.context_window_tokens,
            });
        }

        let budget = match Budget::resolve(model.context_window_tokens, request.usage_fraction) {
            Ok(budget) => budget,
            Err(e) => {
                run.enter(BuildState::Failed);
                return Err(e);
            }
        };
        run.enter(BuildState::BudgetResolved);

        if strategy.effective() == Strategy::Minimal {
            let payload = self.minimal_payload(snapshot, &budget, &mut run)?;
            run.enter(BuildState::Done);
            return Ok(run.finish(payload, model, Some(budget), strategy));
        }

        let mut payload = ContextPayload::empty(budget.usable_tokens);
        let reserve = budget.reserve(self.overview_fraction);
        // one token of the reserve goes to the blank line after the block
        if reserve > 1 {
            let overview = render_overview(snapshot, strategy.lists_file_tree(), reserve - 1);
            if !overview.is_empty() {
                payload.text.push_str(&overview);
                payload.text.push('\n');
                payload.tokens_used = estimate_tokens(&payload.text);
            }
        }
        let mut remaining = budget.usable_tokens.saturating_sub(payload.tokens_used);

        run.enter(BuildState::Prioritizing);
        let (candidates, per_file_budget) = match strategy.effective() {
            Strategy::WholeRepo => {
                let per_file = remaining / snapshot.files.len().max(1);
                tracing::debug!(
                    "whole_repo: {} files, {} tokens each",
                    snapshot.files.len(),
                    per_file
                );
                (snapshot.files.clone(), Some(per_file))
            }
            _ => {
                let prioritizer = Prioritizer::new(self.weights.clone(), SystemTime::now());
                let ranked = prioritizer.rank(
                    snapshot.files.clone(),
                    &request.query,
                    &request.mentioned_paths,
                    &request.recent_paths,
                );
                (ranked, None)
            }
        };

        run.enter(BuildState::Accumulating);
        let mut cancelled = false;
        for (processed, file) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                run.warn(BuildWarning::Cancelled {
                    files_processed: processed,
                });
                cancelled = true;
                break;
            }
            if remaining < self.summarizer.min_useful_tokens {
                tracing::debug!(
                    "{} tokens left, stopping with {} files unprocessed",
                    remaining,
                    candidates.len() - processed
                );
                break;
            }

            let content = match self.cache.get(&file.path) {
                Ok(content) => content,
                Err(e) => {
                    run.warn(BuildWarning::FileSkipped {
                        path: file.relative_path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let allotment = per_file_budget.map_or(remaining, |per_file| per_file.min(remaining));
            let consumed = self.place(file, &content, allotment, &mut payload, &run);
            payload.tokens_used += consumed;
            remaining -= consumed;
        }

        if payload.file_count() == 0 && !(cancelled && !payload.is_empty()) {
            if !cancelled {
                run.warn(BuildWarning::StrategyExhausted { strategy });
            }
            let excluded = std::mem::take(&mut payload.excluded_files);
            payload = self.minimal_payload(snapshot, &budget, &mut run)?;
            payload.excluded_files = excluded;
            run.enter(BuildState::Degraded);
        } else if cancelled {
            run.enter(BuildState::Degraded);
        } else {
            run.enter(BuildState::Done);
        }

        Ok(run.finish(payload, model, Some(budget), strategy))
    }

    /// append one file to the payload within `allotment` tokens, in full if
    /// it fits and summarized otherwise. returns the tokens consumed.
    fn place(
        &self,
        file: &CandidateFile,
        content: &str,
        allotment: usize,
        payload: &mut ContextPayload,
        run: &Run<'_>,
    ) -> usize {
        let path = &file.relative_path;

        let entry = format!("--- {} ---\n{}{}", path, content, ENTRY_TRAILER);
        let cost = estimate_tokens(&entry);
        if cost <= allotment {
            tracing::debug!("including {} in full ({} tokens)", path, cost);
            payload.text.push_str(&entry);
            payload.included_files.push(path.clone());
            run.emit(BuildEvent::FileIncluded {
                path: path.clone(),
                tokens: cost,
            });
            return cost;
        }

        let header = format!("--- {} (summarized) ---\n", path);
        let limit =
            allotment.saturating_sub(estimate_tokens(&header) + estimate_tokens(ENTRY_TRAILER));
        if limit == 0 {
            tracing::debug!("excluding {}: {} tokens do not cover its header", path, allotment);
            return Self::exclude(path, payload, run);
        }
        match summarize(content, limit, &self.summarizer) {
            SummaryOutcome::Truncated {
                text,
                omitted_lines,
            } => {
                let entry = format!("{}{}{}", header, text, ENTRY_TRAILER);
                let cost = estimate_tokens(&entry);
                if cost > allotment {
                    tracing::debug!(
                        "excluding {}: summary needs {} of {} tokens",
                        path,
                        cost,
                        allotment
                    );
                    return Self::exclude(path, payload, run);
                }
                tracing::debug!(
                    "summarized {} to {} tokens ({} lines omitted)",
                    path,
                    cost,
                    omitted_lines
                );
                payload.text.push_str(&entry);
                payload.summarized_files.push(SummarizedFile {
                    path: path.clone(),
                    omitted_lines,
                });
                run.emit(BuildEvent::FileSummarized {
                    path: path.clone(),
                    tokens: cost,
                    omitted_lines,
                });
                cost
            }
            // unchanged cannot happen here: content within `limit` would
            // already have fit under the shorter full-entry header
            SummaryOutcome::Unchanged(_) | SummaryOutcome::Excluded => {
                tracing::debug!("excluding {}: {} tokens is too small", path, limit);
                Self::exclude(path, payload, run)
            }
        }
    }

    fn exclude(path: &str, payload: &mut ContextPayload, run: &Run<'_>) -> usize {
        payload.excluded_files.push(path.to_string());
        run.emit(BuildEvent::FileExcluded {
            path: path.to_string(),
        });
        0
    }

    /// overview and file tree only, spending the whole usable budget on it
    fn minimal_payload(
        &self,
        snapshot: &ProjectSnapshot,
        budget: &Budget,
        run: &mut Run<'_>,
    ) -> Result<ContextPayload> {
        let text = render_overview(snapshot, true, budget.usable_tokens);
        if text.is_empty() {
            run.enter(BuildState::Failed);
            return Err(Error::Context(format!(
                "no context could be produced for {}",
                snapshot.name
            )));
        }
        let mut payload = ContextPayload::empty(budget.usable_tokens);
        payload.tokens_used = estimate_tokens(&text);
        payload.text = text;
        Ok(payload)
    }
}
